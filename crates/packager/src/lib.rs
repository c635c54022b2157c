//! # Chainline Packager
//!
//! Packages functions onto a custom execution runtime the managed platform
//! does not natively support. For each [`FunctionBuildSpec`] the packager:
//!
//! 1. Ensures the external runtime binary is present in the shared build
//!    cache, fetching the release archive on first use only.
//! 2. Writes the function's bundle (entry module, source map, manifest) and
//!    embeds a private copy of the runtime entry binary in it.
//! 3. Records the [`ResourceOverride`] the deploy layer must apply so the
//!    generated resource declares the custom-provided runtime instead of a
//!    platform-managed one.
//!
//! The cache is the only shared mutable state in the build; packaging
//! distinct functions concurrently is supported and exercised by tests.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use chainline_types::{FunctionBuildSpec, PackagedFunction, ResourceOverride, CUSTOM_PROVIDED_RUNTIME};

pub mod bundle;
pub mod cache;
pub mod error;
pub mod fetch;

pub use bundle::{BUNDLE_ENTRY_NAME, BUNDLE_MANIFEST_NAME, SOURCE_MAP_ENV_KEY, SOURCE_MAP_ENV_VALUE};
pub use cache::{RuntimeCache, CACHE_DIR_ENV};
pub use error::PackagerError;
pub use fetch::{HttpRuntimeFetcher, RuntimeFetcher, RuntimeSource, DEFAULT_RELEASE_URL};

/// Packages functions for deployment on the embedded custom runtime.
///
/// Cheap to share across packaging threads: the cache is held by `Arc` and
/// guards its own population, and `package` takes `&self`.
pub struct RuntimePackager {
    cache: Arc<RuntimeCache>,
    fetcher: Arc<dyn RuntimeFetcher>,
    source: RuntimeSource,
    out_root: PathBuf,
}

impl RuntimePackager {
    /// Production packager: shared process-wide cache, HTTP fetcher, latest
    /// runtime release, bundles written under `out_root`.
    pub fn new(out_root: impl Into<PathBuf>) -> Self {
        Self::with_parts(
            RuntimeCache::shared(),
            Arc::new(HttpRuntimeFetcher),
            RuntimeSource::latest_release(),
            out_root,
        )
    }

    /// Packager with injected cache, fetcher, and source. This is the seam
    /// tests and alternative transports plug into.
    pub fn with_parts(
        cache: Arc<RuntimeCache>,
        fetcher: Arc<dyn RuntimeFetcher>,
        source: RuntimeSource,
        out_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            source,
            out_root: out_root.into(),
        }
    }

    /// Directory bundles are written under, one subdirectory per function.
    pub fn out_root(&self) -> &PathBuf {
        &self.out_root
    }

    /// Packages one function: ensures the cached runtime, writes the bundle
    /// with an embedded runtime copy, and returns the artifact plus the
    /// runtime override for the deploy layer.
    pub fn package(&self, spec: &FunctionBuildSpec) -> Result<PackagedFunction, PackagerError> {
        let runtime_entry = self.cache.ensure(&self.source, self.fetcher.as_ref())?;
        let bundle_dir = bundle::write_bundle(spec, &runtime_entry, &self.out_root)?;

        info!(function = %spec.function_name, "function packaged for custom runtime");
        Ok(PackagedFunction {
            function_name: spec.function_name.clone(),
            bundle_dir,
            resource_override: ResourceOverride::new("Runtime", CUSTOM_PROVIDED_RUNTIME),
        })
    }
}
