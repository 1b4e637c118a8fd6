//! Task output type with factory methods.

use super::{BuildArtifact, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The output of a task execution.
///
/// `TaskOutput` is immutable once created and provides factory methods
/// for creating outputs with different statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    /// The status of the task execution.
    pub status: TaskStatus,

    /// The output data (for successful executions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, serde_json::Value>>,

    /// Files produced by the task.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<BuildArtifact>,

    /// Error message (for failed executions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Skip reason (for skipped or blocked executions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,

    /// Cancel reason (for cancelled executions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl Default for TaskOutput {
    fn default() -> Self {
        Self::ok_empty()
    }
}

impl TaskOutput {
    fn with_status(status: TaskStatus) -> Self {
        Self {
            status,
            data: None,
            artifacts: Vec::new(),
            error: None,
            skip_reason: None,
            cancel_reason: None,
        }
    }

    /// Creates a successful output with data.
    #[must_use]
    pub fn ok(data: HashMap<String, serde_json::Value>) -> Self {
        Self {
            data: Some(data),
            ..Self::with_status(TaskStatus::Ok)
        }
    }

    /// Creates a successful output with no data.
    #[must_use]
    pub fn ok_empty() -> Self {
        Self::with_status(TaskStatus::Ok)
    }

    /// Creates a successful output with a single value.
    #[must_use]
    pub fn ok_value(key: impl Into<String>, value: serde_json::Value) -> Self {
        let mut data = HashMap::new();
        data.insert(key.into(), value);
        Self::ok(data)
    }

    /// Creates a skip output with a reason.
    #[must_use]
    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            skip_reason: Some(reason.into()),
            ..Self::with_status(TaskStatus::Skip)
        }
    }

    /// Creates a cancel output with a reason.
    #[must_use]
    pub fn cancel(reason: impl Into<String>) -> Self {
        Self {
            cancel_reason: Some(reason.into()),
            ..Self::with_status(TaskStatus::Cancel)
        }
    }

    /// Creates a failure output with an error message.
    #[must_use]
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::with_status(TaskStatus::Fail)
        }
    }

    /// Creates a blocked output naming the prerequisite that failed.
    #[must_use]
    pub fn blocked(failed_prerequisite: &str) -> Self {
        Self {
            skip_reason: Some(format!("prerequisite '{failed_prerequisite}' did not succeed")),
            ..Self::with_status(TaskStatus::Blocked)
        }
    }

    /// Adds an artifact to the output.
    #[must_use]
    pub fn with_artifact(mut self, artifact: BuildArtifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Returns true if the output lets dependents run.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the output indicates failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// Gets a value from the data.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }
}
