//! Runtime identifiers as the managed platform understands them.
//!
//! The high-level resource model only accepts runtimes from a fixed
//! enumeration; the custom runtime embedded by the packager is not one of
//! them. Synthesized function resources therefore declare a supported
//! placeholder first, and the packager emits an override that rewrites the
//! field to the custom-provided sentinel after synthesis.

use serde::{Deserialize, Serialize};

/// Sentinel runtime identifier meaning "use the bootstrap binary shipped in
/// the bundle" instead of a platform-managed runtime.
pub const CUSTOM_PROVIDED_RUNTIME: &str = "provided.al2023";

/// Name of the runtime entry binary inside the cache and every bundle.
pub const RUNTIME_ENTRY_FILE: &str = "bootstrap";

/// Runtimes the high-level resource model accepts at declaration time.
///
/// Deliberately not exhaustive; only the placeholder the deploy layer uses
/// before the override is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SupportedRuntime {
    /// Managed Node.js runtime, used as the pre-override placeholder.
    #[default]
    #[serde(rename = "nodejs20.x")]
    Nodejs20X,
}

impl SupportedRuntime {
    /// Identifier as it appears in synthesized resources.
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedRuntime::Nodejs20X => "nodejs20.x",
        }
    }
}
