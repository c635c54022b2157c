//! Chain construction and execution error taxonomy.

use thiserror::Error;

/// Build-time errors raised while constructing a chain. All are fatal and
/// caught before any deployment artifact is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    /// A chain needs at least one task to have a start state.
    #[error("chain '{chain}' has no tasks")]
    Empty {
        /// Name of the offending chain.
        chain: String,
    },
    /// Two tasks declared the same result slot key.
    #[error("duplicate result slot '{slot}' in chain '{chain}'")]
    DuplicateResultSlot {
        /// Name of the offending chain.
        chain: String,
        /// The colliding slot key.
        slot: String,
    },
    /// Two tasks declared the same name; results are keyed by task name, so
    /// a collision would overwrite an earlier task's slot.
    #[error("duplicate task name '{name}' in chain '{chain}'")]
    DuplicateTaskName {
        /// Name of the offending chain.
        chain: String,
        /// The colliding task name.
        name: String,
    },
}

/// Runtime errors raised while starting a chain execution.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The seed document must be a JSON object so result paths are writable.
    #[error("execution seed must be a JSON object, got {found}")]
    InvalidSeed {
        /// JSON type of the rejected seed.
        found: &'static str,
    },
}

/// Failure of one invoked function during execution. Halts the in-flight
/// execution; the deployed chain definition itself is unaffected and later
/// executions may still succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("task '{task}' (index {index}) failed: {detail}")]
pub struct TaskInvocationError {
    /// Name of the failing task.
    pub task: String,
    /// Zero-based position of the failing task in its chain.
    pub index: usize,
    /// Error detail reported by the invoked function.
    pub detail: String,
}
