//! Shared data model for the Chainline workspace.
//!
//! The types here describe *what* gets built and deployed: function build
//! specifications consumed by the packager, the packaged artifacts it
//! produces, and the observability options attached to a deployed chain.
//! They carry no behavior beyond construction and serialization; the
//! packager, engine, and deploy crates own the algorithms.

pub mod build;
pub mod observability;
pub mod packaged;
pub mod runtime;

pub use build::{Architecture, BundlingOptions, FunctionBuildSpec, OutputFormat};
pub use observability::{ExecutionMode, LogLevel, LogOptions};
pub use packaged::{PackagedFunction, ResourceOverride};
pub use runtime::{SupportedRuntime, CUSTOM_PROVIDED_RUNTIME, RUNTIME_ENTRY_FILE};
