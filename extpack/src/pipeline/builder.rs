//! Task graph builder with validation.

use super::{TaskGraph, TaskSpec};
use crate::errors::{ContractErrorInfo, CycleDetectedError, PipelineValidationError};
use crate::tasks::Task;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Builder for validated task graphs.
///
/// Prerequisites must be added before the tasks that depend on them.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    tasks: HashMap<String, TaskSpec>,
    /// Insertion order, used to keep the topological order stable.
    task_order: Vec<String>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: HashMap::new(),
            task_order: Vec::new(),
        }
    }

    /// Adds a task named after its runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken, a dependency is unknown or the
    /// task would close a cycle.
    pub fn task(mut self, runner: Arc<dyn Task>, dependencies: &[&str]) -> Result<Self, PipelineValidationError> {
        let spec = TaskSpec::new(runner).with_dependencies(dependencies.iter().copied());
        self.add_task_spec(spec)?;
        Ok(self)
    }

    /// Adds a prepared spec.
    ///
    /// # Errors
    ///
    /// See [`task`](Self::task).
    pub fn add_task_spec(&mut self, spec: TaskSpec) -> Result<(), PipelineValidationError> {
        spec.validate()?;

        if self.tasks.contains_key(&spec.name) {
            return Err(PipelineValidationError::new(format!(
                "Task '{}' is defined twice",
                spec.name
            ))
            .with_tasks(vec![spec.name.clone()])
            .with_error_info(
                ContractErrorInfo::new("GRAPH-DUPLICATE", format!("Duplicate task '{}'", spec.name))
                    .with_fix_hint("Give every task a unique name."),
            ));
        }

        for dep in &spec.dependencies {
            if !self.tasks.contains_key(dep) {
                return Err(PipelineValidationError::new(format!(
                    "Task '{}' depends on unknown task '{dep}'",
                    spec.name
                ))
                .with_tasks(vec![spec.name.clone(), dep.clone()])
                .with_error_info(
                    ContractErrorInfo::new("GRAPH-MISSING_DEP", format!("Dependency '{dep}' not found"))
                        .with_fix_hint("Add the dependency before the task that depends on it.")
                        .with_context_entry("task", spec.name.clone()),
                ));
            }
        }

        self.task_order.push(spec.name.clone());
        self.tasks.insert(spec.name.clone(), spec);

        if let Err(cycle) = self.detect_cycles() {
            if let Some(name) = self.task_order.pop() {
                self.tasks.remove(&name);
            }
            return Err(cycle.into());
        }
        Ok(())
    }

    /// Builds the graph.
    ///
    /// # Errors
    ///
    /// Returns an error if no task was added.
    pub fn build(self) -> Result<TaskGraph, PipelineValidationError> {
        if self.tasks.is_empty() {
            return Err(PipelineValidationError::new("Task graph has no tasks").with_error_info(
                ContractErrorInfo::new("GRAPH-EMPTY", "Cannot build an empty task graph")
                    .with_fix_hint("Add at least one task before building."),
            ));
        }
        Ok(TaskGraph::new(self.name, self.tasks, &self.task_order))
    }

    /// Returns the graph name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of tasks added so far.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    fn detect_cycles(&self) -> Result<(), CycleDetectedError> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for name in &self.task_order {
            if !visited.contains(name.as_str()) {
                if let Some(cycle) = self.dfs_cycle(name, &mut visited, &mut rec_stack, &mut path) {
                    return Err(CycleDetectedError::new(cycle));
                }
            }
        }
        Ok(())
    }

    fn dfs_cycle<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node);

        if let Some(spec) = self.tasks.get(node) {
            for dep in &spec.dependencies {
                if rec_stack.contains(dep.as_str()) {
                    let start = path.iter().position(|n| *n == dep.as_str()).unwrap_or(0);
                    let mut cycle: Vec<String> = path[start..].iter().map(|n| (*n).to_string()).collect();
                    cycle.push(dep.clone());
                    return Some(cycle);
                }
                if !visited.contains(dep.as_str()) {
                    if let Some(cycle) = self.dfs_cycle(dep, visited, rec_stack, path) {
                        return Some(cycle);
                    }
                }
            }
        }

        path.pop();
        rec_stack.remove(node);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::GroupTask;

    fn group(name: &str) -> Arc<dyn Task> {
        Arc::new(GroupTask::new(name))
    }

    #[test]
    fn test_builder_with_dependencies() {
        let builder = PipelineBuilder::new("build")
            .task(group("clean"), &[])
            .unwrap()
            .task(group("compile"), &["clean"])
            .unwrap();

        assert_eq!(builder.name(), "build");
        assert_eq!(builder.task_count(), 2);
    }

    #[test]
    fn test_builder_missing_dependency() {
        let err = PipelineBuilder::new("build")
            .task(group("compile"), &["clean"])
            .unwrap_err();

        assert_eq!(err.code(), Some("GRAPH-MISSING_DEP"));
        assert_eq!(err.tasks, vec!["compile", "clean"]);
    }

    #[test]
    fn test_builder_duplicate_task() {
        let err = PipelineBuilder::new("build")
            .task(group("clean"), &[])
            .unwrap()
            .task(group("clean"), &[])
            .unwrap_err();
        assert_eq!(err.code(), Some("GRAPH-DUPLICATE"));
    }

    #[test]
    fn test_builder_self_dependency() {
        let err = PipelineBuilder::new("build").task(group("clean"), &["clean"]).unwrap_err();
        assert_eq!(err.code(), Some("GRAPH-SELF_DEP"));
    }

    #[test]
    fn test_cycle_detection() {
        let mut builder = PipelineBuilder::new("build");
        for (name, dep) in [("a", "c"), ("b", "a"), ("c", "b")] {
            builder.task_order.push(name.to_string());
            builder
                .tasks
                .insert(name.to_string(), TaskSpec::new(group(name)).with_dependency(dep));
        }

        let err = builder.detect_cycles().unwrap_err();
        assert_eq!(err.error_info.code, "GRAPH-CYCLE");
        assert_eq!(err.cycle_path.first(), err.cycle_path.last());
        assert_eq!(err.cycle_path.len(), 4);
    }

    #[test]
    fn test_builder_empty_build() {
        let err = PipelineBuilder::new("build").build().unwrap_err();
        assert_eq!(err.code(), Some("GRAPH-EMPTY"));
    }

    #[test]
    fn test_builder_build_success() {
        let graph = PipelineBuilder::new("build")
            .task(group("clean"), &[])
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(graph.name(), "build");
        assert_eq!(graph.task_count(), 1);
    }
}
