//! Artifacts produced by the packager and consumed by the deploy layer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Instruction to patch one field of a generated resource after synthesis.
///
/// The resource model has no first-class notion of a custom runtime, so the
/// packager records the patch it needs as data instead of mutating anything
/// itself. The deploy layer applies overrides as an explicit final step,
/// which keeps the workaround visible in the synthesized output path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOverride {
    /// Property name to replace, e.g. `Runtime`.
    pub path: String,
    /// Replacement value.
    pub value: String,
}

impl ResourceOverride {
    pub fn new(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

/// A function ready for deployment: its bundle on disk plus the metadata
/// override required to run it on the embedded runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagedFunction {
    /// Deployed function name.
    pub function_name: String,
    /// Directory holding the bundled entry, manifest, and runtime binary.
    pub bundle_dir: PathBuf,
    /// Post-synthesis patch pointing the resource at the embedded runtime.
    pub resource_override: ResourceOverride,
}
