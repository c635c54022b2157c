//! # Chainline Engine
//!
//! Builds and executes strictly sequential task chains. A chain is an
//! ordered list of tasks fixed at construction time; each task invokes one
//! packaged function and writes its result into a distinct slot of a shared
//! execution-state document.
//!
//! Construction and execution are deliberately decoupled:
//!
//! - [`Chain::new`] validates the ordering and uniqueness invariants and
//!   produces an immutable data structure.
//! - [`Chain::to_execution_graph`] is a pure transform to the managed
//!   service's graph description, used at synthesis time.
//! - [`execute_chain`] is the reference executor implementing the required
//!   execution semantics (strict order, fail-fast, accumulated state), used
//!   for local runs and tests without any real execution environment.

pub mod chain;
pub mod error;
pub mod executor;
pub mod graph;

pub use chain::{Chain, Task};
pub use error::{ChainError, ExecutionError, TaskInvocationError};
pub use executor::{execute_chain, ChainExecution, ChainStatus, ExecutionState, FunctionRunner, TaskRecord, TaskStatus};
pub use graph::{ExecutionGraph, GraphState, TASK_RESULTS_KEY};
