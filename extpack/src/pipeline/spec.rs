//! Task specifications.

use crate::core::TaskKind;
use crate::errors::{ContractErrorInfo, PipelineValidationError};
use crate::tasks::Task;
use std::sync::Arc;

/// One node of the task graph: a runner and the names it depends on.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    /// The unique name of the task.
    pub name: String,
    /// The task implementation.
    pub runner: Arc<dyn Task>,
    /// Names of prerequisite tasks, deduplicated, in declaration order.
    pub dependencies: Vec<String>,
    /// The kind of task.
    pub kind: TaskKind,
}

impl TaskSpec {
    /// Creates a spec named after its runner.
    #[must_use]
    pub fn new(runner: Arc<dyn Task>) -> Self {
        Self {
            name: runner.name().to_string(),
            kind: runner.kind(),
            runner,
            dependencies: Vec::new(),
        }
    }

    /// Sets the dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.dependencies.clear();
        for dep in deps {
            self = self.with_dependency(dep);
        }
        self
    }

    /// Adds a dependency. Repeats are ignored.
    #[must_use]
    pub fn with_dependency(mut self, dep: impl Into<String>) -> Self {
        let dep = dep.into();
        if !self.dependencies.contains(&dep) {
            self.dependencies.push(dep);
        }
        self
    }

    /// Returns whether the task depends directly on `name`.
    #[must_use]
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d == name)
    }

    /// Validates the spec in isolation.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the task depends on itself.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::new("Task name cannot be empty")
                .with_error_info(ContractErrorInfo::new("GRAPH-EMPTY_NAME", "Task name is blank")));
        }
        if self.depends_on(&self.name) {
            return Err(PipelineValidationError::new(format!(
                "Task '{}' cannot depend on itself",
                self.name
            ))
            .with_tasks(vec![self.name.clone()])
            .with_error_info(ContractErrorInfo::new(
                "GRAPH-SELF_DEP",
                format!("Task '{}' lists itself as a prerequisite", self.name),
            )));
        }
        Ok(())
    }
}
