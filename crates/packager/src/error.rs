//! Packaging error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while packaging a function. All variants are fatal to the
/// build; the caller must not deploy a partially packaged chain.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// Network or archive-extraction failure while populating the runtime cache.
    #[error("runtime fetch failed: {detail}")]
    Fetch {
        /// Human-readable failure description from the transport or extractor.
        detail: String,
    },
    /// The cache directory exists but lacks the expected entry binary.
    #[error("runtime cache at {path} is present but missing its entry binary")]
    CacheIntegrity {
        /// Path of the corrupt cache directory.
        path: PathBuf,
    },
    /// Filesystem failure while staging the cache or writing a bundle.
    #[error("packaging I/O error at {path}: {source}")]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PackagerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn fetch(detail: impl Into<String>) -> Self {
        Self::Fetch { detail: detail.into() }
    }
}
