//! Build-time function specifications consumed by the packager.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Target CPU architecture for packaged functions.
///
/// Every function in a chain is built for the same architecture; the fetched
/// runtime archive is architecture-specific, so mixing targets within one
/// build cache is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    /// 64-bit ARM, the only architecture the embedded runtime ships for here.
    #[default]
    Arm64,
}

impl Architecture {
    /// Platform identifier as it appears in synthesized resources.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Arm64 => "arm64",
        }
    }
}

/// Module format emitted by the bundling step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ECMAScript modules, required by the embedded runtime's loader.
    #[default]
    Esm,
}

impl OutputFormat {
    /// Format label recorded in bundle manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Esm => "esm",
        }
    }
}

/// Options applied when bundling a function's entry module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundlingOptions {
    /// Output module format.
    pub format: OutputFormat,
    /// Whether the bundled output is minified.
    pub minify: bool,
    /// Whether a source map is emitted alongside the bundle.
    pub source_map: bool,
    /// Language target for the emitted module.
    pub target: String,
}

impl Default for BundlingOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Esm,
            minify: true,
            source_map: true,
            target: "es2020".to_string(),
        }
    }
}

/// Build specification for a single function.
///
/// Owned by the packager for the duration of one `package` call and immutable
/// once constructed. The environment map is the only field the packager
/// augments (it injects the source-map option before writing the bundle);
/// that happens on a clone, never on the spec itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionBuildSpec {
    /// Path to the function's entry module, relative to the project root.
    pub entry: PathBuf,
    /// Deployed function name; also the bundle directory name.
    pub function_name: String,
    /// Target architecture, fixed for the whole build.
    #[serde(default)]
    pub architecture: Architecture,
    /// Bundling options applied to the entry module.
    #[serde(default)]
    pub bundling: BundlingOptions,
    /// Environment variables shipped with the function.
    #[serde(default)]
    pub environment: IndexMap<String, String>,
}

impl FunctionBuildSpec {
    /// Creates a spec with default bundling for the fixed architecture.
    pub fn new(entry: impl Into<PathBuf>, function_name: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            function_name: function_name.into(),
            architecture: Architecture::Arm64,
            bundling: BundlingOptions::default(),
            environment: IndexMap::new(),
        }
    }

    /// Adds an environment variable to the spec.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bundling_matches_runtime_requirements() {
        let bundling = BundlingOptions::default();
        assert_eq!(bundling.format, OutputFormat::Esm);
        assert!(bundling.minify);
        assert!(bundling.source_map);
        assert_eq!(bundling.target, "es2020");
    }

    #[test]
    fn spec_builder_records_environment() {
        let spec = FunctionBuildSpec::new("intrinsics/date.mjs", "IntrinsicFn-Date").with_env("TZ", "UTC");
        assert_eq!(spec.function_name, "IntrinsicFn-Date");
        assert_eq!(spec.architecture, Architecture::Arm64);
        assert_eq!(spec.environment.get("TZ").map(String::as_str), Some("UTC"));
    }
}
