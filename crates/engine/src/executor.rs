//! Reference executor implementing the chain's required execution semantics.
//!
//! Execution is a single sequential flow: one task at a time, in chain
//! order, each receiving the entire execution state accumulated so far. A
//! task failure halts the execution immediately; no retry, no fallback, no
//! partial-success state. The executor owns one [`ExecutionState`] per call,
//! so independent executions of the same chain can run concurrently with no
//! shared state.

use serde::Serialize;
use serde_json::{Map as JsonMap, Value};
use tracing::{debug, warn};

use crate::chain::{Chain, Task};
use crate::error::{ExecutionError, TaskInvocationError};
use crate::graph::TASK_RESULTS_KEY;

/// Seam through which the executor invokes opaque functions.
///
/// Implementations receive the function reference and the full execution
/// state document and return the raw output payload. They succeed or fail;
/// nothing else about their behavior is assumed.
pub trait FunctionRunner: Send + Sync {
    fn invoke(&self, function_name: &str, input: &Value) -> anyhow::Result<Value>;
}

/// The JSON document accumulated across one execution of a chain.
///
/// Grows monotonically: each completed task adds one entry under
/// `taskResults.<taskName>` holding exactly its declared slot key. Exists
/// only for the lifetime of one execution and is never shared between
/// executions.
#[derive(Debug, Clone)]
pub struct ExecutionState {
    document: Value,
}

impl ExecutionState {
    /// Starts an execution state from an arbitrary seed document. The seed
    /// must be a JSON object so result paths are writable.
    pub fn seed(seed: Value) -> Result<Self, ExecutionError> {
        if !seed.is_object() {
            return Err(ExecutionError::InvalidSeed { found: json_kind(&seed) });
        }
        Ok(Self { document: seed })
    }

    /// Read-only view of the accumulated document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Consumes the state, yielding the accumulated document.
    pub fn into_document(self) -> Value {
        self.document
    }

    /// The `taskResults` entry recorded for a task, if it has run.
    pub fn task_result(&self, task_name: &str) -> Option<&Value> {
        self.document.get(TASK_RESULTS_KEY)?.get(task_name)
    }

    fn record_result(&mut self, task: &Task, payload: Value) {
        let mut slot = JsonMap::with_capacity(1);
        slot.insert(task.result_slot.clone(), payload);

        let root = self
            .document
            .as_object_mut()
            .expect("execution state document is always an object");
        let results = root
            .entry(TASK_RESULTS_KEY.to_string())
            .or_insert_with(|| Value::Object(JsonMap::new()));
        if !results.is_object() {
            // A seed may carry a non-object taskResults field; results win.
            *results = Value::Object(JsonMap::new());
        }
        results
            .as_object_mut()
            .expect("taskResults is an object")
            .insert(task.name.clone(), Value::Object(slot));
    }
}

/// Lifecycle of one chain execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ChainStatus {
    /// Execution created but no task started yet.
    NotStarted,
    /// The task at `task_index` is in flight.
    Running { task_index: usize },
    /// Every task completed successfully. Terminal.
    Succeeded,
    /// The task at `task_index` failed; no later task ran. Terminal.
    Failed { task_index: usize },
}

/// Outcome of one task within an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded,
    Failed,
}

/// Per-task record of an execution. Tasks that never started (after a
/// failure) have no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    /// Zero-based position in the chain.
    pub index: usize,
    /// Task name.
    pub name: String,
    /// Outcome of this task.
    pub status: TaskStatus,
    /// Failure detail for failed tasks.
    pub error: Option<TaskInvocationError>,
}

/// Result of one complete (or halted) chain execution.
#[derive(Debug, Clone)]
pub struct ChainExecution {
    /// Name of the executed chain.
    pub chain: String,
    /// Terminal status: `Succeeded` or `Failed`.
    pub status: ChainStatus,
    /// The fully accumulated execution state document.
    pub state: Value,
    /// One record per attempted task, in execution order.
    pub records: Vec<TaskRecord>,
}

impl ChainExecution {
    /// The failing task's error, when the execution failed.
    pub fn failure(&self) -> Option<&TaskInvocationError> {
        self.records.iter().rev().find_map(|r| r.error.as_ref())
    }
}

/// Executes a chain to completion against the given runner.
///
/// Tasks run strictly in chain order; task *k+1* starts only after task *k*
/// reports success. On failure the execution halts with a `Failed` status
/// identifying the failing task, and the returned state omits every task
/// that never ran.
pub fn execute_chain(chain: &Chain, seed: Value, runner: &dyn FunctionRunner) -> Result<ChainExecution, ExecutionError> {
    let mut state = ExecutionState::seed(seed)?;
    let mut records = Vec::with_capacity(chain.len());

    for (index, task) in chain.tasks().iter().enumerate() {
        debug!(chain = chain.name(), task = %task.name, index, "invoking task");

        match runner.invoke(&task.function_name, state.document()) {
            Ok(payload) => {
                state.record_result(task, payload);
                records.push(TaskRecord {
                    index,
                    name: task.name.clone(),
                    status: TaskStatus::Succeeded,
                    error: None,
                });
            }
            Err(err) => {
                let error = TaskInvocationError {
                    task: task.name.clone(),
                    index,
                    detail: err.to_string(),
                };
                warn!(chain = chain.name(), task = %task.name, index, error = %error.detail, "task failed, halting execution");
                records.push(TaskRecord {
                    index,
                    name: task.name.clone(),
                    status: TaskStatus::Failed,
                    error: Some(error),
                });
                return Ok(ChainExecution {
                    chain: chain.name().to_string(),
                    status: ChainStatus::Failed { task_index: index },
                    state: state.into_document(),
                    records,
                });
            }
        }
    }

    debug!(chain = chain.name(), tasks = chain.len(), "execution succeeded");
    Ok(ChainExecution {
        chain: chain.name().to_string(),
        status: ChainStatus::Succeeded,
        state: state.into_document(),
        records,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn demo_chain() -> Chain {
        Chain::new(
            "CustomIntrinsics",
            vec![
                Task::new("Date", "IntrinsicFn-Date", "date"),
                Task::new("Nanoid", "IntrinsicFn-Nanoid", "nanoid"),
                Task::new("Ulid", "IntrinsicFn-Ulid", "ulid"),
                Task::new("Hello", "HelloFn", "hello"),
            ],
        )
        .expect("valid chain")
    }

    /// Runner returning a fixed payload per function, recording call order.
    struct ScriptedRunner {
        invocations: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl ScriptedRunner {
        fn new() -> Self {
            Self {
                invocations: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(function: &'static str) -> Self {
            Self {
                invocations: Mutex::new(Vec::new()),
                fail_on: Some(function),
            }
        }

        fn invoked(&self) -> Vec<String> {
            self.invocations.lock().expect("invocation lock").clone()
        }
    }

    impl FunctionRunner for ScriptedRunner {
        fn invoke(&self, function_name: &str, _input: &Value) -> anyhow::Result<Value> {
            self.invocations.lock().expect("invocation lock").push(function_name.to_string());
            if self.fail_on == Some(function_name) {
                anyhow::bail!("invocation timed out");
            }
            let payload = match function_name {
                "IntrinsicFn-Date" => "D",
                "IntrinsicFn-Nanoid" => "N",
                "IntrinsicFn-Ulid" => "U",
                _ => "H",
            };
            Ok(json!(payload))
        }
    }

    #[test]
    fn tasks_execute_in_chain_order() {
        let chain = demo_chain();
        let runner = ScriptedRunner::new();

        let execution = execute_chain(&chain, json!({}), &runner).expect("execute");

        assert_eq!(execution.status, ChainStatus::Succeeded);
        assert_eq!(
            runner.invoked(),
            vec!["IntrinsicFn-Date", "IntrinsicFn-Nanoid", "IntrinsicFn-Ulid", "HelloFn"]
        );
    }

    #[test]
    fn successful_execution_populates_every_slot() {
        let chain = demo_chain();
        let execution = execute_chain(&chain, json!({"request": "abc"}), &ScriptedRunner::new()).expect("execute");

        let results = &execution.state["taskResults"];
        assert_eq!(results["Date"]["date"], "D");
        assert_eq!(results["Nanoid"]["nanoid"], "N");
        assert_eq!(results["Ulid"]["ulid"], "U");
        assert_eq!(results["Hello"]["hello"], "H");
        // Seed fields survive alongside accumulated results.
        assert_eq!(execution.state["request"], "abc");
    }

    #[test]
    fn each_task_result_holds_exactly_its_declared_slot() {
        let chain = demo_chain();
        let execution = execute_chain(&chain, json!({}), &ScriptedRunner::new()).expect("execute");

        for task in chain.tasks() {
            let entry = execution.state["taskResults"][&task.name]
                .as_object()
                .expect("task result object");
            assert_eq!(entry.len(), 1, "task '{}' must hold one slot", task.name);
            assert!(entry.contains_key(&task.result_slot));
        }
    }

    #[test]
    fn failure_halts_execution_and_skips_remaining_tasks() {
        let chain = demo_chain();
        let runner = ScriptedRunner::failing_on("IntrinsicFn-Ulid");

        let execution = execute_chain(&chain, json!({}), &runner).expect("execute");

        assert_eq!(execution.status, ChainStatus::Failed { task_index: 2 });
        assert_eq!(runner.invoked().len(), 3, "Hello must never start");
        assert!(execution.state["taskResults"].get("Hello").is_none());
        assert!(execution.state["taskResults"].get("Ulid").is_none());
        assert_eq!(execution.state["taskResults"]["Nanoid"]["nanoid"], "N");

        let failure = execution.failure().expect("failure detail");
        assert_eq!(failure.task, "Ulid");
        assert_eq!(failure.index, 2);
        assert!(failure.detail.contains("timed out"));

        let last = execution.records.last().expect("failed record");
        assert_eq!(last.status, TaskStatus::Failed);
        assert_eq!(execution.records.len(), 3);
    }

    #[test]
    fn each_task_receives_the_accumulated_state() {
        struct AssertingRunner;
        impl FunctionRunner for AssertingRunner {
            fn invoke(&self, function_name: &str, input: &Value) -> anyhow::Result<Value> {
                if function_name == "IntrinsicFn-Nanoid" {
                    // By the second task the first task's result is visible.
                    assert_eq!(input["taskResults"]["Date"]["date"], "ok");
                }
                Ok(json!("ok"))
            }
        }

        let chain = Chain::new(
            "demo",
            vec![
                Task::new("Date", "IntrinsicFn-Date", "date"),
                Task::new("Nanoid", "IntrinsicFn-Nanoid", "nanoid"),
            ],
        )
        .expect("valid chain");

        let execution = execute_chain(&chain, json!({}), &AssertingRunner).expect("execute");
        assert_eq!(execution.status, ChainStatus::Succeeded);
    }

    #[test]
    fn non_object_seed_is_rejected() {
        let chain = demo_chain();
        let err = execute_chain(&chain, json!(["not", "an", "object"]), &ScriptedRunner::new()).expect_err("bad seed");
        assert!(matches!(err, ExecutionError::InvalidSeed { found: "array" }));
    }

    #[test]
    fn concurrent_executions_own_independent_state() {
        let chain = demo_chain();
        let chain_ref = &chain;

        std::thread::scope(|scope| {
            let first = scope.spawn(move || {
                execute_chain(chain_ref, json!({"run": 1}), &ScriptedRunner::new()).expect("execute first")
            });
            let second = scope.spawn(move || {
                execute_chain(chain_ref, json!({"run": 2}), &ScriptedRunner::new()).expect("execute second")
            });

            let first = first.join().expect("join first");
            let second = second.join().expect("join second");
            assert_eq!(first.state["run"], 1);
            assert_eq!(second.state["run"], 2);
            assert_eq!(first.status, ChainStatus::Succeeded);
            assert_eq!(second.status, ChainStatus::Succeeded);
        });
    }
}
