//! Failure handling for graph execution.

use serde::{Deserialize, Serialize};

/// What the executor does after a task fails.
///
/// Dependents of a failed task never run in either mode; they are reported as
/// blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Keep running branches that do not depend on the failure.
    #[default]
    ContinueOnFailure,
    /// Start no new tasks once anything fails; running tasks finish.
    FailFast,
}

impl FailureMode {
    /// Returns whether a failure stops further scheduling.
    #[must_use]
    pub const fn halts_on_failure(self) -> bool {
        matches!(self, Self::FailFast)
    }
}
