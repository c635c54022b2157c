//! Deployment synthesis.
//!
//! Turns a built deployment into a plain JSON document describing the
//! resources to create: one function resource per packaged function, the
//! state machine embedding the chain's execution graph, and the log group
//! backing the execution-history sink.
//!
//! Function resources are first generated with a runtime from the supported
//! enumeration, then each packaged function's override is applied as an
//! explicit final patch step. Synthesis never hides the workaround: the
//! override is visible both in the packager's output contract and in this
//! module's [`apply_override`].

use serde_json::{json, Value};
use tracing::debug;

use chainline_engine::Chain;
use chainline_types::{PackagedFunction, ResourceOverride, SupportedRuntime};

use crate::descriptor::DeploymentDescriptor;

/// A fully built deployment: packaged functions plus the assembled chain.
#[derive(Debug, Clone)]
pub struct Deployment {
    descriptor: DeploymentDescriptor,
    functions: Vec<PackagedFunction>,
    chain: Chain,
}

impl Deployment {
    pub(crate) fn new(descriptor: DeploymentDescriptor, functions: Vec<PackagedFunction>, chain: Chain) -> Self {
        Self {
            descriptor,
            functions,
            chain,
        }
    }

    /// The descriptor this deployment was built from.
    pub fn descriptor(&self) -> &DeploymentDescriptor {
        &self.descriptor
    }

    /// Packaged functions in chain order.
    pub fn functions(&self) -> &[PackagedFunction] {
        &self.functions
    }

    /// The assembled chain.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Synthesizes the deployment document.
    pub fn synth(&self) -> Value {
        let mut resources = serde_json::Map::new();

        for function in &self.functions {
            let mut resource = function_resource(function);
            apply_override(&mut resource, &function.resource_override);
            resources.insert(function.function_name.clone(), resource);
        }

        let logs = &self.descriptor.logs;
        resources.insert(
            format!("{}-Logs", self.descriptor.name),
            json!({
                "type": "LogGroup",
                "properties": {
                    "LogGroupName": logs.log_group_name,
                    "RetentionInDays": logs.retention_days,
                },
            }),
        );

        resources.insert(
            self.descriptor.name.clone(),
            json!({
                "type": "StateMachine",
                "properties": {
                    "StateMachineName": self.descriptor.name,
                    "StateMachineType": self.descriptor.mode.as_str(),
                    "Definition": self.chain.to_execution_graph(),
                    "LoggingConfiguration": {
                        "Destination": logs.log_group_name,
                        "IncludeExecutionData": logs.include_execution_data,
                        "Level": logs.level,
                    },
                },
            }),
        );

        debug!(chain = %self.descriptor.name, resources = resources.len(), "deployment synthesized");
        json!({
            "name": self.descriptor.name,
            "resources": resources,
        })
    }
}

/// Generates one function resource as the high-level model allows: with a
/// runtime from the supported enumeration, not the custom one actually used.
fn function_resource(function: &PackagedFunction) -> Value {
    json!({
        "type": "Function",
        "properties": {
            "FunctionName": function.function_name,
            "Runtime": SupportedRuntime::default().as_str(),
            "Handler": "index.handler",
            "Architectures": ["arm64"],
            "Code": { "path": function.bundle_dir },
        },
    })
}

/// Applies one post-synthesis property override to a generated resource.
pub fn apply_override(resource: &mut Value, resource_override: &ResourceOverride) {
    if let Some(properties) = resource.get_mut("properties").and_then(Value::as_object_mut) {
        properties.insert(
            resource_override.path.clone(),
            Value::String(resource_override.value.clone()),
        );
    }
}
