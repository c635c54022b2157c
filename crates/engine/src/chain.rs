//! Chain construction and validation.
//!
//! A chain is an ordered list of tasks fixed at construction time. Building
//! one validates the uniqueness invariants up front so every downstream
//! consumer (graph transform, executor, deploy synthesis) can rely on them
//! without re-checking.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use chainline_types::PackagedFunction;

use crate::error::ChainError;

/// One node in a chain: an invocation of one packaged function plus the
/// slot key its result is written under. Immutable once the chain is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task name; keys the `taskResults` entry for this task.
    pub name: String,
    /// Name of the function this task invokes.
    pub function_name: String,
    /// Slot key the function's output is written under.
    pub result_slot: String,
}

impl Task {
    pub fn new(name: impl Into<String>, function_name: impl Into<String>, result_slot: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            function_name: function_name.into(),
            result_slot: result_slot.into(),
        }
    }

    /// Task invoking a packaged function, with the result slot derived as
    /// the lowercased task name.
    pub fn for_function(name: impl Into<String>, function: &PackagedFunction) -> Self {
        let name = name.into();
        let result_slot = name.to_lowercase();
        Self {
            function_name: function.function_name.clone(),
            name,
            result_slot,
        }
    }
}

/// A fixed, ordered sequence of tasks.
///
/// The order is total and set at construction; there are no conditional
/// edges, no parallel branches, and no loops. The chain never mutates after
/// `new` returns. Deserialization routes through [`Chain::new`], so a
/// decoded chain upholds the same invariants as a constructed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChainParts")]
pub struct Chain {
    name: String,
    tasks: Vec<Task>,
}

/// Raw wire shape of a chain, validated into [`Chain`] on deserialization.
#[derive(Deserialize)]
struct ChainParts {
    name: String,
    tasks: Vec<Task>,
}

impl TryFrom<ChainParts> for Chain {
    type Error = ChainError;

    fn try_from(parts: ChainParts) -> Result<Self, Self::Error> {
        Chain::new(parts.name, parts.tasks)
    }
}

impl Chain {
    /// Builds a chain, rejecting empty task lists, duplicate task names,
    /// and duplicate result slot keys.
    pub fn new(name: impl Into<String>, tasks: Vec<Task>) -> Result<Self, ChainError> {
        let name = name.into();
        if tasks.is_empty() {
            return Err(ChainError::Empty { chain: name });
        }

        let mut names: HashSet<&str> = HashSet::new();
        let mut slots: HashSet<&str> = HashSet::new();
        for task in &tasks {
            if !names.insert(&task.name) {
                return Err(ChainError::DuplicateTaskName {
                    chain: name,
                    name: task.name.clone(),
                });
            }
            if !slots.insert(&task.result_slot) {
                return Err(ChainError::DuplicateResultSlot {
                    chain: name,
                    slot: task.result_slot.clone(),
                });
            }
        }

        Ok(Self { name, tasks })
    }

    /// Chain name, also the deployed execution unit's identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tasks in execution order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks in the chain.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Always false for a constructed chain; kept for the conventional pair.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainline_types::ResourceOverride;
    use std::path::PathBuf;

    fn task(name: &str, slot: &str) -> Task {
        Task::new(name, format!("IntrinsicFn-{name}"), slot)
    }

    #[test]
    fn chain_preserves_construction_order() {
        let chain = Chain::new(
            "CustomIntrinsics",
            vec![task("Date", "date"), task("Nanoid", "nanoid"), task("Ulid", "ulid"), task("Hello", "hello")],
        )
        .expect("valid chain");

        let order: Vec<&str> = chain.tasks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["Date", "Nanoid", "Ulid", "Hello"]);
        assert_eq!(chain.len(), 4);
    }

    #[test]
    fn duplicate_result_slot_is_rejected_at_construction() {
        let err = Chain::new("demo", vec![task("Date", "shared"), task("Hello", "shared")]).expect_err("duplicate slot");
        assert_eq!(
            err,
            ChainError::DuplicateResultSlot {
                chain: "demo".into(),
                slot: "shared".into(),
            }
        );
    }

    #[test]
    fn duplicate_task_name_is_rejected_at_construction() {
        let err = Chain::new("demo", vec![task("Date", "a"), task("Date", "b")]).expect_err("duplicate name");
        assert_eq!(
            err,
            ChainError::DuplicateTaskName {
                chain: "demo".into(),
                name: "Date".into(),
            }
        );
    }

    #[test]
    fn empty_chain_is_rejected() {
        let err = Chain::new("demo", vec![]).expect_err("empty chain");
        assert_eq!(err, ChainError::Empty { chain: "demo".into() });
    }

    #[test]
    fn deserialized_empty_chain_is_rejected() {
        let err = serde_json::from_str::<Chain>(r#"{"name": "demo", "tasks": []}"#).expect_err("empty chain");
        assert!(err.to_string().contains("has no tasks"));
    }

    #[test]
    fn deserialized_duplicate_slot_is_rejected() {
        let raw = r#"{
            "name": "demo",
            "tasks": [
                {"name": "Date", "function_name": "IntrinsicFn-Date", "result_slot": "shared"},
                {"name": "Hello", "function_name": "Hello", "result_slot": "shared"}
            ]
        }"#;
        let err = serde_json::from_str::<Chain>(raw).expect_err("duplicate slot");
        assert!(err.to_string().contains("duplicate result slot 'shared'"));
    }

    #[test]
    fn deserialized_chain_round_trips_through_validation() {
        let chain = Chain::new("demo", vec![task("Date", "date"), task("Hello", "hello")]).expect("valid chain");
        let encoded = serde_json::to_string(&chain).expect("serialize chain");
        let decoded: Chain = serde_json::from_str(&encoded).expect("deserialize chain");
        assert_eq!(decoded, chain);
    }

    #[test]
    fn task_for_function_derives_slot_from_name() {
        let function = PackagedFunction {
            function_name: "IntrinsicFn-Nanoid".into(),
            bundle_dir: PathBuf::from("out/IntrinsicFn-Nanoid"),
            resource_override: ResourceOverride::new("Runtime", "provided.al2023"),
        };

        let task = Task::for_function("Nanoid", &function);
        assert_eq!(task.name, "Nanoid");
        assert_eq!(task.function_name, "IntrinsicFn-Nanoid");
        assert_eq!(task.result_slot, "nanoid");
    }
}
