//! Pure transform from a chain to the managed service's graph description.
//!
//! The graph is data, not behavior: each task becomes one state that invokes
//! its function, writes the selected payload under the task's result path,
//! and links unconditionally to the next state. Serialization follows the
//! service's state-language shape (`StartAt`/`States`/`Next`/`End`), which
//! is what the deploy layer embeds in the synthesized state-machine resource.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value};

use crate::chain::{Chain, Task};

/// Root key every task result lands under in the execution state document.
pub const TASK_RESULTS_KEY: &str = "taskResults";

/// Selector path extracting the raw function output from an invocation.
const PAYLOAD_SELECTOR: &str = "$.Payload";

/// One state of the execution graph.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct GraphState {
    /// State kind; always a function-invoking task state.
    #[serde(rename = "Type")]
    pub kind: String,
    /// Reference to the invoked function.
    pub resource: String,
    /// Where in the execution state the selected result is written.
    pub result_path: String,
    /// Single-key selector mapping the task's slot to the raw payload.
    pub result_selector: JsonMap<String, Value>,
    /// Name of the next state; absent on the terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Marks the terminal state.
    #[serde(skip_serializing_if = "is_false")]
    pub end: bool,
}

/// Strictly sequential execution graph for one chain.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ExecutionGraph {
    /// Name of the first state.
    pub start_at: String,
    /// States keyed by task name, in chain order.
    pub states: IndexMap<String, GraphState>,
}

impl Chain {
    /// Builds the execution graph: state *i* links to state *i+1* with no
    /// conditional edges, and the last state terminates the execution.
    pub fn to_execution_graph(&self) -> ExecutionGraph {
        let tasks = self.tasks();
        let mut states = IndexMap::with_capacity(tasks.len());

        for (index, task) in tasks.iter().enumerate() {
            let next = tasks.get(index + 1).map(|t| t.name.clone());
            let end = next.is_none();
            states.insert(task.name.clone(), graph_state(task, next, end));
        }

        ExecutionGraph {
            start_at: tasks[0].name.clone(),
            states,
        }
    }
}

/// JSONPath under which one task's selected result is written.
pub fn result_path(task: &Task) -> String {
    format!("$.{TASK_RESULTS_KEY}.{}", task.name)
}

fn graph_state(task: &Task, next: Option<String>, end: bool) -> GraphState {
    let mut result_selector = JsonMap::with_capacity(1);
    result_selector.insert(format!("{}.$", task.result_slot), Value::String(PAYLOAD_SELECTOR.to_string()));

    GraphState {
        kind: "Task".to_string(),
        resource: task.function_name.clone(),
        result_path: result_path(task),
        result_selector,
        next,
        end,
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
