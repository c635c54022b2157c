//! Per-function bundle assembly.
//!
//! A bundle is a directory shipped as one function's deployable artifact:
//! the entry module rewritten per the bundling options, its source map, a
//! manifest describing how the bundle was produced, and a private copy of
//! the runtime entry binary. Each function carries its own runtime copy even
//! though the binary was fetched into the shared cache only once.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::debug;

use chainline_types::{FunctionBuildSpec, RUNTIME_ENTRY_FILE};

use crate::error::PackagerError;

/// Environment variable enabling source-map-aware stack traces, injected
/// into every bundle regardless of the spec's own environment.
pub const SOURCE_MAP_ENV_KEY: &str = "NODE_OPTIONS";
pub const SOURCE_MAP_ENV_VALUE: &str = "--enable-source-maps";

/// File name of the bundled entry module.
pub const BUNDLE_ENTRY_NAME: &str = "index.mjs";

/// File name of the bundle manifest.
pub const BUNDLE_MANIFEST_NAME: &str = "bundle-manifest.json";

/// Writes the bundle for one function under `out_root` and returns the
/// bundle directory.
pub fn write_bundle(spec: &FunctionBuildSpec, runtime_entry: &Path, out_root: &Path) -> Result<PathBuf, PackagerError> {
    let bundle_dir = out_root.join(&spec.function_name);
    fs::create_dir_all(&bundle_dir).map_err(|e| PackagerError::io(&bundle_dir, e))?;

    let source = fs::read_to_string(&spec.entry).map_err(|e| PackagerError::io(&spec.entry, e))?;

    let entry_out = bundle_dir.join(BUNDLE_ENTRY_NAME);
    let emitted = if spec.bundling.minify { minify_module(&source) } else { source };
    fs::write(&entry_out, &emitted).map_err(|e| PackagerError::io(&entry_out, e))?;

    if spec.bundling.source_map {
        let map_out = bundle_dir.join(format!("{BUNDLE_ENTRY_NAME}.map"));
        let map = json!({
            "version": 3,
            "file": BUNDLE_ENTRY_NAME,
            "sources": [spec.entry.display().to_string()],
            "names": [],
            "mappings": "",
        });
        fs::write(&map_out, map.to_string()).map_err(|e| PackagerError::io(&map_out, e))?;
    }

    let mut environment = spec.environment.clone();
    environment.insert(SOURCE_MAP_ENV_KEY.to_string(), SOURCE_MAP_ENV_VALUE.to_string());

    let manifest_out = bundle_dir.join(BUNDLE_MANIFEST_NAME);
    let manifest = json!({
        "function_name": spec.function_name,
        "entry": spec.entry.display().to_string(),
        "architecture": spec.architecture.as_str(),
        "format": spec.bundling.format.as_str(),
        "target": spec.bundling.target,
        "minify": spec.bundling.minify,
        "source_map": spec.bundling.source_map,
        "environment": environment,
    });
    let manifest_pretty = serde_json::to_string_pretty(&manifest)
        .map_err(|e| PackagerError::io(&manifest_out, std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    fs::write(&manifest_out, manifest_pretty).map_err(|e| PackagerError::io(&manifest_out, e))?;

    let runtime_out = bundle_dir.join(RUNTIME_ENTRY_FILE);
    fs::copy(runtime_entry, &runtime_out).map_err(|e| PackagerError::io(&runtime_out, e))?;

    debug!(function = %spec.function_name, dir = %bundle_dir.display(), "bundle written");
    Ok(bundle_dir)
}

/// Light minification: strips line comments, blank lines, and indentation.
/// The emitted module stays line-for-line traceable through the source map.
fn minify_module(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        out.push_str(trimmed);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainline_types::BundlingOptions;

    fn spec_with_entry(dir: &Path, name: &str, body: &str) -> FunctionBuildSpec {
        let entry = dir.join(format!("{name}.mjs"));
        fs::write(&entry, body).expect("write entry");
        FunctionBuildSpec::new(entry, name)
    }

    fn fake_runtime(dir: &Path) -> PathBuf {
        let path = dir.join(RUNTIME_ENTRY_FILE);
        fs::write(&path, b"#!runtime").expect("write runtime");
        path
    }

    #[test]
    fn bundle_carries_entry_manifest_map_and_runtime() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spec = spec_with_entry(dir.path(), "Hello", "export const handler = async () => \"hi\";\n");
        let runtime = fake_runtime(dir.path());

        let bundle = write_bundle(&spec, &runtime, &dir.path().join("out")).expect("bundle");

        assert!(bundle.join(BUNDLE_ENTRY_NAME).is_file());
        assert!(bundle.join(format!("{BUNDLE_ENTRY_NAME}.map")).is_file());
        assert!(bundle.join(BUNDLE_MANIFEST_NAME).is_file());
        assert_eq!(fs::read(bundle.join(RUNTIME_ENTRY_FILE)).expect("runtime copy"), b"#!runtime");
    }

    #[test]
    fn manifest_injects_source_map_environment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spec = spec_with_entry(dir.path(), "Date", "export const handler = async () => Date.now();\n");
        let runtime = fake_runtime(dir.path());

        let bundle = write_bundle(&spec, &runtime, &dir.path().join("out")).expect("bundle");
        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(bundle.join(BUNDLE_MANIFEST_NAME)).expect("read manifest"))
                .expect("parse manifest");

        assert_eq!(manifest["environment"][SOURCE_MAP_ENV_KEY], SOURCE_MAP_ENV_VALUE);
        assert_eq!(manifest["format"], "esm");
        assert_eq!(manifest["target"], "es2020");
    }

    #[test]
    fn minified_entry_drops_comments_and_blank_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let body = "// header comment\n\nexport const handler = async () => {\n    return 1;\n};\n";
        let spec = spec_with_entry(dir.path(), "Min", body);
        let runtime = fake_runtime(dir.path());

        let bundle = write_bundle(&spec, &runtime, &dir.path().join("out")).expect("bundle");
        let emitted = fs::read_to_string(bundle.join(BUNDLE_ENTRY_NAME)).expect("read bundle");

        assert!(!emitted.contains("comment"));
        assert!(!emitted.contains("\n\n"));
        assert!(emitted.contains("return 1;"));
    }

    #[test]
    fn unminified_entry_is_copied_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let body = "// kept\nexport const handler = async () => 1;\n";
        let mut spec = spec_with_entry(dir.path(), "Raw", body);
        spec.bundling = BundlingOptions {
            minify: false,
            ..BundlingOptions::default()
        };
        let runtime = fake_runtime(dir.path());

        let bundle = write_bundle(&spec, &runtime, &dir.path().join("out")).expect("bundle");
        let emitted = fs::read_to_string(bundle.join(BUNDLE_ENTRY_NAME)).expect("read bundle");
        assert_eq!(emitted, body);
    }

    #[test]
    fn missing_entry_module_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let spec = FunctionBuildSpec::new(dir.path().join("absent.mjs"), "Ghost");
        let runtime = fake_runtime(dir.path());

        let err = write_bundle(&spec, &runtime, &dir.path().join("out")).expect_err("missing entry");
        assert!(matches!(err, PackagerError::Io { .. }));
    }
}
