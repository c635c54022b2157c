//! Shared build cache for the fetched runtime binary.
//!
//! One cache serves every function packaged during a build, so the expensive
//! network fetch happens at most once no matter how many functions need the
//! runtime, including when they are packaged concurrently. A process-local
//! mutex serializes in-process callers; publication by atomic directory
//! rename keeps the populated cache consistent for everyone else. A reader
//! can never observe a partially unpacked cache: the runtime directory
//! either does not exist yet or is complete.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tracing::{debug, info};

use chainline_types::RUNTIME_ENTRY_FILE;

use crate::error::PackagerError;
use crate::fetch::{RuntimeFetcher, RuntimeSource};

/// Environment variable overriding the cache root directory.
pub const CACHE_DIR_ENV: &str = "CHAINLINE_CACHE_DIR";

/// Subdirectory of the cache root holding the unpacked runtime.
const RUNTIME_DIR_NAME: &str = "llrt";

static SHARED_CACHE: Lazy<Arc<RuntimeCache>> = Lazy::new(|| Arc::new(RuntimeCache::new(default_cache_root())));

/// Build-wide cache of the externally fetched runtime binary.
///
/// Lazily populated on first [`ensure`](RuntimeCache::ensure) and never
/// explicitly destroyed; the populated directory outlives the build and is
/// reused by later builds as a cache hit.
#[derive(Debug)]
pub struct RuntimeCache {
    root: PathBuf,
    populate_lock: Mutex<()>,
}

impl RuntimeCache {
    /// Creates a cache rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            populate_lock: Mutex::new(()),
        }
    }

    /// The process-wide cache at the default root, shared by reference
    /// across every packager constructed in this build.
    pub fn shared() -> Arc<RuntimeCache> {
        Arc::clone(&SHARED_CACHE)
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory the unpacked runtime is published to.
    pub fn runtime_dir(&self) -> PathBuf {
        self.root.join(RUNTIME_DIR_NAME)
    }

    /// Path of the runtime entry binary once the cache is populated.
    pub fn entry_path(&self) -> PathBuf {
        self.runtime_dir().join(RUNTIME_ENTRY_FILE)
    }

    /// Ensures the runtime entry binary is present, fetching it on first use.
    ///
    /// Returns the path of the cached entry binary. Concurrent callers
    /// serialize on the populate lock: exactly one performs the fetch while
    /// the rest subsequently observe the populated cache and skip retrieval.
    pub fn ensure(&self, source: &RuntimeSource, fetcher: &dyn RuntimeFetcher) -> Result<PathBuf, PackagerError> {
        let _guard = self.populate_lock.lock().expect("runtime cache lock poisoned");

        let runtime_dir = self.runtime_dir();
        let entry = self.entry_path();
        if runtime_dir.exists() {
            if entry.is_file() {
                debug!(path = %entry.display(), "runtime cache hit, skipping fetch");
                return Ok(entry);
            }
            return Err(PackagerError::CacheIntegrity { path: runtime_dir });
        }

        fs::create_dir_all(&self.root).map_err(|e| PackagerError::io(&self.root, e))?;

        // Populate a private staging directory, then publish it with a
        // single rename so no reader sees a half-unpacked cache.
        let staging = self.root.join(format!(".{RUNTIME_DIR_NAME}-staging-{}", std::process::id()));
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| PackagerError::io(&staging, e))?;
        }
        fs::create_dir_all(&staging).map_err(|e| PackagerError::io(&staging, e))?;

        if let Err(err) = self.populate_staging(source, fetcher, &staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(err);
        }

        match fs::rename(&staging, &runtime_dir) {
            Ok(()) => {
                info!(path = %runtime_dir.display(), "runtime cache populated");
            }
            Err(rename_err) => {
                // Another process published first. Losing that race is fine
                // as long as the winner left a complete cache behind.
                let _ = fs::remove_dir_all(&staging);
                if !entry.is_file() {
                    return Err(PackagerError::io(&runtime_dir, rename_err));
                }
                debug!(path = %runtime_dir.display(), "runtime cache published by a concurrent build");
            }
        }

        Ok(entry)
    }

    fn populate_staging(
        &self,
        source: &RuntimeSource,
        fetcher: &dyn RuntimeFetcher,
        staging: &Path,
    ) -> Result<(), PackagerError> {
        fetcher.fetch_runtime(source, staging)?;

        let staged_entry = staging.join(RUNTIME_ENTRY_FILE);
        if !staged_entry.is_file() {
            return Err(PackagerError::fetch(format!(
                "fetched archive did not contain the '{RUNTIME_ENTRY_FILE}' entry binary"
            )));
        }
        Ok(())
    }
}

fn default_cache_root() -> PathBuf {
    if let Ok(path) = std::env::var(CACHE_DIR_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    dirs_next::cache_dir().unwrap_or_else(|| PathBuf::from(".")).join("chainline")
}
