//! Top-level deployment composition.
//!
//! The descriptor is pure wiring: it names the functions to package, hands
//! them to the packager (concurrently, since the shared runtime cache
//! guards itself), assembles the ordered chain, and attaches execution
//! observability. All algorithmic content lives in the packager and engine.

use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use chainline_engine::{Chain, Task};
use chainline_packager::{PackagerError, RuntimePackager};
use chainline_types::{ExecutionMode, FunctionBuildSpec, LogOptions, PackagedFunction};

use crate::synth::Deployment;

/// One function to package and chain, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Logical identifier; becomes the task name and results key.
    pub id: String,
    /// Path to the function's entry module.
    pub entry: PathBuf,
    /// Deployed function name.
    pub function_name: String,
}

impl FunctionDefinition {
    pub fn new(id: impl Into<String>, entry: impl Into<PathBuf>, function_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entry: entry.into(),
            function_name: function_name.into(),
        }
    }
}

/// Describes one deployable chain: its functions, in order, plus the
/// observability and execution mode attached to the execution unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentDescriptor {
    /// Stable, human-readable identifier of the execution unit.
    pub name: String,
    /// Functions in chain order.
    pub functions: Vec<FunctionDefinition>,
    /// Execution-history log sink configuration.
    pub logs: LogOptions,
    /// Execution mode of the chain.
    pub mode: ExecutionMode,
}

impl DeploymentDescriptor {
    /// Descriptor with the verbose short-retention sink and express mode.
    pub fn new(name: impl Into<String>, functions: Vec<FunctionDefinition>) -> Self {
        let name = name.into();
        let logs = LogOptions::verbose_short_retention(&name);
        Self {
            name,
            functions,
            logs,
            mode: ExecutionMode::Express,
        }
    }

    /// The stock intrinsics chain: date, nanoid, and ulid producers followed
    /// by a hello-world payload producer.
    pub fn default_intrinsics() -> Self {
        Self::new(
            "CustomIntrinsics",
            vec![
                FunctionDefinition::new("Date", "intrinsics/date.mjs", "IntrinsicFn-Date"),
                FunctionDefinition::new("Nanoid", "intrinsics/nanoid.mjs", "IntrinsicFn-Nanoid"),
                FunctionDefinition::new("Ulid", "intrinsics/ulid.mjs", "IntrinsicFn-Ulid"),
                FunctionDefinition::new("Hello", "functions/hello.mjs", "Hello"),
            ],
        )
    }

    /// Packages every function and assembles the chain.
    ///
    /// Functions are packaged concurrently; the packager's shared cache
    /// guarantees the runtime fetch still happens at most once. Any
    /// packaging or chain-construction failure aborts the whole build.
    pub fn build(&self, packager: &RuntimePackager) -> Result<Deployment> {
        info!(chain = %self.name, functions = self.functions.len(), "building deployment");

        let packaged: Vec<PackagedFunction> = thread::scope(|scope| {
            let handles: Vec<_> = self
                .functions
                .iter()
                .map(|definition| {
                    let spec = FunctionBuildSpec::new(definition.entry.clone(), definition.function_name.clone());
                    scope.spawn(move || packager.package(&spec))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("packaging thread panicked"))
                .collect::<Result<Vec<_>, PackagerError>>()
        })
        .with_context(|| format!("packaging functions for chain '{}'", self.name))?;

        let tasks: Vec<Task> = self
            .functions
            .iter()
            .zip(&packaged)
            .map(|(definition, function)| Task::for_function(&definition.id, function))
            .collect();
        let chain = Chain::new(&self.name, tasks).with_context(|| format!("assembling chain '{}'", self.name))?;

        Ok(Deployment::new(self.clone(), packaged, chain))
    }
}
