//! Thread-safe storage for task outputs.

use crate::core::{BuildArtifact, TaskOutput};
use crate::errors::ExtpackError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Outputs of finished tasks, keyed by task name.
///
/// Each task records exactly once; a second write is an error.
#[derive(Debug, Default)]
pub struct OutputBag {
    outputs: RwLock<HashMap<String, TaskOutput>>,
}

impl OutputBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the output of `task`.
    ///
    /// # Errors
    ///
    /// Returns an error if `task` already recorded an output.
    pub fn record(&self, task: impl Into<String>, output: TaskOutput) -> Result<(), ExtpackError> {
        let task = task.into();
        let mut outputs = self.outputs.write();
        if outputs.contains_key(&task) {
            return Err(ExtpackError::Internal(format!(
                "Task '{task}' recorded its output twice"
            )));
        }
        outputs.insert(task, output);
        Ok(())
    }

    /// Returns a copy of a task's output.
    #[must_use]
    pub fn get(&self, task: &str) -> Option<TaskOutput> {
        self.outputs.read().get(task).cloned()
    }

    /// Returns every artifact recorded so far, ordered by path.
    #[must_use]
    pub fn artifacts(&self) -> Vec<BuildArtifact> {
        let mut artifacts: Vec<BuildArtifact> = self
            .outputs
            .read()
            .values()
            .flat_map(|o| o.artifacts.iter().cloned())
            .collect();
        artifacts.sort_by(|a, b| a.path.cmp(&b.path));
        artifacts
    }

    /// Returns a copy of all outputs.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, TaskOutput> {
        self.outputs.read().clone()
    }

    /// Returns the number of recorded outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.read().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.read().is_empty()
    }
}
