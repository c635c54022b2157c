//! Retrieval of the external runtime release archive.
//!
//! The fetcher is a seam: the production implementation downloads the latest
//! release archive over HTTP and unpacks it, while tests substitute a fake
//! that populates the staging directory directly. Cache bookkeeping (the
//! fetch-or-skip decision, staging, atomic publication) lives in
//! [`crate::cache`], not here.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use url::Url;

use crate::error::PackagerError;

/// Release archive for the LLRT runtime, latest build for the fixed
/// architecture. No checksum or signature accompanies the release; the
/// fetch trusts the transport.
pub const DEFAULT_RELEASE_URL: &str = "https://github.com/awslabs/llrt/releases/latest/download/llrt-lambda-arm64.zip";

/// Name given to the transport archive while it sits in the staging
/// directory. Removed once extraction succeeds.
const TRANSPORT_ARCHIVE_NAME: &str = "runtime-archive.zip";

/// Remote location of the runtime release archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSource {
    url: String,
}

impl RuntimeSource {
    /// The latest published release of the runtime project.
    pub fn latest_release() -> Self {
        Self {
            url: DEFAULT_RELEASE_URL.to_string(),
        }
    }

    /// A source at an explicit URL, validated up front.
    pub fn from_url(url: &str) -> Result<Self, PackagerError> {
        Url::parse(url).map_err(|e| PackagerError::fetch(format!("invalid runtime source URL '{url}': {e}")))?;
        Ok(Self { url: url.to_string() })
    }

    /// The archive URL this source resolves to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for RuntimeSource {
    fn default() -> Self {
        Self::latest_release()
    }
}

/// Retrieves a runtime release into a staging directory.
///
/// Implementations must leave the entry binary at the top of `staging` and
/// must not touch anything outside it. Any transport artifacts they create
/// under `staging` should be removed before returning.
pub trait RuntimeFetcher: Send + Sync {
    fn fetch_runtime(&self, source: &RuntimeSource, staging: &Path) -> Result<(), PackagerError>;
}

/// Production fetcher: downloads the release archive over HTTP, unpacks it
/// in place, and discards the transport archive.
#[derive(Debug, Default)]
pub struct HttpRuntimeFetcher;

impl RuntimeFetcher for HttpRuntimeFetcher {
    fn fetch_runtime(&self, source: &RuntimeSource, staging: &Path) -> Result<(), PackagerError> {
        info!(url = source.url(), "fetching runtime release archive");

        let bytes = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(download(source.url())),
            Err(e) => Err(format!("runtime init failed: {e}")),
        }
        .map_err(PackagerError::fetch)?;

        let archive = staging.join(TRANSPORT_ARCHIVE_NAME);
        fs::write(&archive, &bytes).map_err(|e| PackagerError::io(&archive, e))?;

        self_update::Extract::from_source(&archive)
            .archive(self_update::ArchiveKind::Zip)
            .extract_into(staging)
            .map_err(|e| PackagerError::fetch(format!("archive extraction failed: {e}")))?;

        fs::remove_file(&archive).map_err(|e| PackagerError::io(&archive, e))?;
        debug!(bytes = bytes.len(), "runtime archive unpacked and discarded");
        Ok(())
    }
}

async fn download(url: &str) -> Result<Vec<u8>, String> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| format!("network error fetching '{url}': {e}"))?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {} fetching '{url}'", status.as_u16()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("failed reading response body from '{url}': {e}"))?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_release_points_at_the_runtime_project() {
        let source = RuntimeSource::latest_release();
        assert!(source.url().contains("llrt"));
        assert!(source.url().ends_with(".zip"));
    }

    #[test]
    fn from_url_rejects_garbage() {
        let err = RuntimeSource::from_url("not a url").expect_err("should reject");
        assert!(matches!(err, PackagerError::Fetch { .. }));
    }

    #[test]
    fn from_url_accepts_https() {
        let source = RuntimeSource::from_url("https://example.com/runtime.zip").expect("valid URL");
        assert_eq!(source.url(), "https://example.com/runtime.zip");
    }
}
