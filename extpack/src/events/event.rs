//! Event payloads emitted while a build runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The graph started running.
    BuildStarted,
    /// The graph finished, successfully or not.
    BuildFinished,
    /// A task began executing.
    TaskStarted,
    /// A task finished successfully.
    TaskCompleted,
    /// A task chose not to run.
    TaskSkipped,
    /// A task failed.
    TaskFailed,
    /// A task never ran because a prerequisite did not succeed.
    TaskBlocked,
    /// A task observed cancellation.
    TaskCancelled,
}

impl EventKind {
    /// Dotted event name, e.g. `task.started`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BuildStarted => "build.started",
            Self::BuildFinished => "build.finished",
            Self::TaskStarted => "task.started",
            Self::TaskCompleted => "task.completed",
            Self::TaskSkipped => "task.skipped",
            Self::TaskFailed => "task.failed",
            Self::TaskBlocked => "task.blocked",
            Self::TaskCancelled => "task.cancelled",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One build event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildEvent {
    /// Event kind.
    pub kind: EventKind,
    /// The build run this event belongs to.
    pub run_id: Uuid,
    /// Task name, absent for build-level events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Extra fields such as durations or error messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl BuildEvent {
    /// Creates a build-level event.
    #[must_use]
    pub fn build(kind: EventKind, run_id: Uuid) -> Self {
        Self {
            kind,
            run_id,
            task: None,
            timestamp: Utc::now(),
            data: None,
        }
    }

    /// Creates a task-level event.
    #[must_use]
    pub fn task(kind: EventKind, run_id: Uuid, task: impl Into<String>) -> Self {
        Self {
            task: Some(task.into()),
            ..Self::build(kind, run_id)
        }
    }

    /// Attaches data.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
