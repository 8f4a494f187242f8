//! Task and executor-status types.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use velo_broker::Payload;

/// A unit of executor work.
///
/// Owned by the daemon while active (at most one at a time); ownership
/// transfers to the executor for the duration of execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// What kind of task this is (e.g. `"chat"`).
    pub kind: String,
    /// The task input.
    pub input: Payload,
    /// Task-specific options.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, serde_json::Value>,
}

impl Task {
    /// Create a task with a freshly minted id.
    pub fn new(kind: impl Into<String>, input: impl Into<Payload>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.into(),
            input: input.into(),
            options: HashMap::new(),
        }
    }

    /// Attach an option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// The state of a task executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorState {
    /// The executor is idle.
    Idle,
    /// The executor is working on a task.
    Working,
    /// The executor encountered an error.
    Error,
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// An executor's self-reported status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorStatus {
    /// Current executor state.
    pub state: ExecutorState,
    /// The task currently being executed, if any.
    pub current_task: Option<Task>,
    /// Completion percentage, 0–100.
    pub progress: u8,
    /// Free-form status message.
    pub message: String,
}

impl ExecutorStatus {
    /// An idle status with no task and no progress.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            state: ExecutorState::Idle,
            current_task: None,
            progress: 0,
            message: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tasks_get_unique_ids() {
        let a = Task::new("chat", "hello");
        let b = Task::new("chat", "hello");
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind, "chat");
    }

    #[test]
    fn task_options_accumulate() {
        let task = Task::new("chat", "hi")
            .with_option("temperature", serde_json::json!(0.7))
            .with_option("stream", serde_json::json!(true));
        assert_eq!(task.options.len(), 2);
    }

    #[test]
    fn executor_state_displays_lowercase() {
        assert_eq!(ExecutorState::Idle.to_string(), "idle");
        assert_eq!(ExecutorState::Working.to_string(), "working");
        assert_eq!(ExecutorState::Error.to_string(), "error");
    }

    #[test]
    fn idle_status_is_empty() {
        let status = ExecutorStatus::idle();
        assert_eq!(status.state, ExecutorState::Idle);
        assert!(status.current_task.is_none());
        assert_eq!(status.progress, 0);
    }
}
