//! # Chainline Deploy
//!
//! Composition layer tying the packager and engine together. A
//! [`DeploymentDescriptor`] names the functions to package and the chain to
//! assemble; [`Deployment::synth`] emits the resulting deployment document,
//! applying each packaged function's runtime override as an explicit
//! post-synthesis patch.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

pub mod descriptor;
pub mod synth;

pub use descriptor::{DeploymentDescriptor, FunctionDefinition};
pub use synth::{apply_override, Deployment};

/// On-disk deployment manifest, YAML or JSON.
#[derive(Debug, Deserialize)]
struct DeploymentManifest {
    name: String,
    functions: Vec<FunctionDefinition>,
}

/// Loads a deployment descriptor from a manifest file.
///
/// YAML and JSON are both accepted; the file is parsed as YAML, of which
/// JSON is a subset. Observability options and execution mode use the
/// standard verbose short-retention express configuration.
pub fn parse_deployment_file(file_path: impl AsRef<Path>) -> Result<DeploymentDescriptor> {
    let file_path = file_path.as_ref();
    let content =
        fs::read_to_string(file_path).with_context(|| format!("failed to read deployment manifest: {}", file_path.display()))?;

    let manifest: DeploymentManifest = serde_yaml::from_str(&content)
        .with_context(|| format!("unsupported deployment manifest format: {}", file_path.display()))?;

    Ok(DeploymentDescriptor::new(manifest.name, manifest.functions))
}
