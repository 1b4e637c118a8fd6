//! Task graph execution engine.
//!
//! A task starts as soon as every prerequisite has succeeded, so independent
//! branches (the three platform pipelines, the compile steps) run concurrently.
//! When a task fails, everything downstream of it is reported as blocked while
//! unrelated branches keep going.

use super::{FailureMode, TaskSpec};
use crate::context::{BuildContext, TaskContext};
use crate::core::{BuildArtifact, TaskOutput, TaskStatus};
use crate::errors::{ContractErrorInfo, ExtpackError, PipelineValidationError};
use crate::events::{BuildEvent, EventKind};
use crate::tasks::Task;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde_json::json;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

type RunningTask = BoxFuture<'static, (String, Result<TaskOutput, tokio::task::JoinError>)>;

/// Result of executing a task graph.
#[derive(Debug, Clone)]
pub struct GraphExecutionResult {
    /// Output of every task in the graph, including blocked and cancelled ones.
    pub outputs: HashMap<String, TaskOutput>,
    /// When execution started.
    pub started_at: DateTime<Utc>,
    /// Total execution time in milliseconds.
    pub duration_ms: f64,
    /// Whether every task succeeded or skipped.
    pub success: bool,
    /// Whether the run was cancelled.
    pub cancelled: bool,
    /// Summary of what went wrong.
    pub error: Option<String>,
}

impl GraphExecutionResult {
    fn tasks_with(&self, status: TaskStatus) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .outputs
            .iter()
            .filter(|(_, output)| output.status == status)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Names of failed tasks, sorted.
    #[must_use]
    pub fn failed_tasks(&self) -> Vec<&str> {
        self.tasks_with(TaskStatus::Fail)
    }

    /// Names of tasks that never ran because a prerequisite did not succeed.
    #[must_use]
    pub fn blocked_tasks(&self) -> Vec<&str> {
        self.tasks_with(TaskStatus::Blocked)
    }

    /// Status of one task.
    #[must_use]
    pub fn status_of(&self, task: &str) -> Option<TaskStatus> {
        self.outputs.get(task).map(|o| o.status)
    }

    /// Every artifact produced, ordered by path.
    #[must_use]
    pub fn artifacts(&self) -> Vec<&BuildArtifact> {
        let mut artifacts: Vec<&BuildArtifact> =
            self.outputs.values().flat_map(|o| o.artifacts.iter()).collect();
        artifacts.sort_by(|a, b| a.path.cmp(&b.path));
        artifacts
    }
}

/// A validated directed acyclic graph of tasks.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    name: String,
    tasks: HashMap<String, TaskSpec>,
    /// Topologically sorted, stable with respect to insertion order.
    execution_order: Vec<String>,
    /// Reverse edges, each list in execution order.
    dependents: HashMap<String, Vec<String>>,
    failure_mode: FailureMode,
}

impl TaskGraph {
    /// Creates a graph from already validated specs.
    #[must_use]
    pub fn new(name: String, tasks: HashMap<String, TaskSpec>, task_order: &[String]) -> Self {
        let execution_order = topological_sort(&tasks, task_order);

        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for name in &execution_order {
            if let Some(spec) = tasks.get(name) {
                for dep in &spec.dependencies {
                    dependents.entry(dep.clone()).or_default().push(name.clone());
                }
            }
        }

        Self {
            name,
            tasks,
            execution_order,
            dependents,
            failure_mode: FailureMode::default(),
        }
    }

    /// Sets the failure mode.
    #[must_use]
    pub const fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// Returns the graph name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Returns the failure mode.
    #[must_use]
    pub const fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    /// Returns the topological execution order.
    #[must_use]
    pub fn execution_order(&self) -> &[String] {
        &self.execution_order
    }

    /// Returns whether the graph has a task called `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Returns the direct prerequisites of `name`.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.tasks.get(name).map_or(&[], |spec| spec.dependencies.as_slice())
    }

    /// Returns the tasks that directly depend on `name`.
    #[must_use]
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.dependents.get(name).map_or(&[], Vec::as_slice)
    }

    /// Returns the graph restricted to `target` and its transitive
    /// prerequisites.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` is not in the graph.
    pub fn subgraph(&self, target: &str) -> Result<Self, PipelineValidationError> {
        if !self.contains(target) {
            return Err(PipelineValidationError::new(format!("Unknown task '{target}'"))
                .with_tasks(vec![target.to_string()])
                .with_error_info(
                    ContractErrorInfo::new("GRAPH-UNKNOWN_TARGET", format!("No task named '{target}'"))
                        .with_fix_hint("Run with --list to see the available tasks."),
                ));
        }

        let mut keep: HashSet<&str> = HashSet::new();
        let mut stack = vec![target];
        while let Some(name) = stack.pop() {
            if keep.insert(name) {
                stack.extend(self.dependencies_of(name).iter().map(String::as_str));
            }
        }

        let tasks = self
            .tasks
            .iter()
            .filter(|(name, _)| keep.contains(name.as_str()))
            .map(|(name, spec)| (name.clone(), spec.clone()))
            .collect();
        let order: Vec<String> = self
            .execution_order
            .iter()
            .filter(|name| keep.contains(name.as_str()))
            .cloned()
            .collect();

        Ok(Self::new(self.name.clone(), tasks, &order).with_failure_mode(self.failure_mode))
    }

    /// Runs every task in the graph.
    ///
    /// Task failures are reported in the result, not as `Err`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the executor's own bookkeeping breaks, e.g. a
    /// task output is recorded twice in the build context.
    pub async fn execute(&self, ctx: Arc<BuildContext>) -> Result<GraphExecutionResult, ExtpackError> {
        let started_at = Utc::now();
        let start = Instant::now();
        ctx.emit(
            EventKind::BuildStarted,
            Some(json!({ "graph": self.name, "tasks": self.execution_order })),
        );

        let token = Arc::clone(ctx.cancellation());
        let mut outputs: HashMap<String, TaskOutput> = HashMap::new();
        let mut unmet: HashMap<&str, usize> = self
            .tasks
            .iter()
            .map(|(name, spec)| (name.as_str(), spec.dependencies.len()))
            .collect();
        let mut running: FuturesUnordered<RunningTask> = FuturesUnordered::new();
        let mut cancelled = token.is_cancelled();
        let mut halted = false;

        if !cancelled {
            for name in &self.execution_order {
                if unmet.get(name.as_str()) == Some(&0) {
                    running.push(self.spawn_task(name, &ctx)?);
                }
            }
        }

        while !running.is_empty() {
            let next = tokio::select! {
                () = token.cancelled(), if !cancelled => {
                    cancelled = true;
                    info!(graph = %self.name, "Cancellation requested, waiting for running tasks");
                    continue;
                }
                next = running.next() => next,
            };
            let Some((name, joined)) = next else {
                break;
            };

            let output = joined.unwrap_or_else(|e| TaskOutput::fail(format!("task panicked: {e}")));
            let succeeded = output.is_success();
            let failed = output.is_failure();
            record(&ctx, &mut outputs, &name, output)?;
            cancelled |= token.is_cancelled();

            if succeeded {
                if cancelled || halted {
                    continue;
                }
                for child in self.dependents_of(&name) {
                    if let Some(count) = unmet.get_mut(child.as_str()) {
                        *count = count.saturating_sub(1);
                        if *count == 0 && !outputs.contains_key(child) {
                            running.push(self.spawn_task(child, &ctx)?);
                        }
                    }
                }
            } else if !cancelled {
                self.block_dependents(&ctx, &mut outputs, &name)?;
                if failed && self.failure_mode.halts_on_failure() {
                    warn!(graph = %self.name, task = %name, "Failing fast, no new tasks will start");
                    halted = true;
                }
            }
        }

        let reason = token.reason().unwrap_or_else(|| "cancelled".to_string());
        for name in &self.execution_order {
            if outputs.contains_key(name) {
                continue;
            }
            let output = if cancelled {
                TaskOutput::cancel(reason.clone())
            } else if halted {
                TaskOutput::cancel("not started after an earlier failure")
            } else {
                return Err(ExtpackError::Internal(format!(
                    "Task '{name}' was never scheduled"
                )));
            };
            emit_for_task(&ctx, name, EventKind::TaskCancelled, json!({ "reason": output.cancel_reason }));
            record(&ctx, &mut outputs, name, output)?;
        }

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        let mut result = GraphExecutionResult {
            success: !cancelled && outputs.values().all(TaskOutput::is_success),
            outputs,
            started_at,
            duration_ms,
            cancelled,
            error: None,
        };
        result.error = if cancelled {
            Some(format!("Build cancelled: {reason}"))
        } else if result.success {
            None
        } else {
            Some(format!("Failed tasks: {}", result.failed_tasks().join(", ")))
        };

        ctx.emit(
            EventKind::BuildFinished,
            Some(json!({
                "graph": self.name,
                "success": result.success,
                "cancelled": result.cancelled,
                "failed": result.failed_tasks(),
                "blocked": result.blocked_tasks(),
                "duration_ms": duration_ms,
            })),
        );
        Ok(result)
    }

    fn spawn_task(&self, name: &str, ctx: &Arc<BuildContext>) -> Result<RunningTask, ExtpackError> {
        let spec = self
            .tasks
            .get(name)
            .ok_or_else(|| ExtpackError::Internal(format!("Unknown task '{name}'")))?;
        let runner = Arc::clone(&spec.runner);
        let task_ctx = TaskContext::new(Arc::clone(ctx), name);
        let handle = tokio::spawn(run_task(runner, task_ctx));
        let name = name.to_string();
        Ok(async move { (name, handle.await) }.boxed())
    }

    /// Marks everything downstream of `failed` as blocked.
    fn block_dependents(
        &self,
        ctx: &BuildContext,
        outputs: &mut HashMap<String, TaskOutput>,
        failed: &str,
    ) -> Result<(), ExtpackError> {
        let mut queue: VecDeque<&str> = self.dependents_of(failed).iter().map(String::as_str).collect();
        while let Some(name) = queue.pop_front() {
            if outputs.contains_key(name) {
                continue;
            }
            debug!(task = name, prerequisite = failed, "Blocking task");
            emit_for_task(ctx, name, EventKind::TaskBlocked, json!({ "prerequisite": failed }));
            record(ctx, outputs, name, TaskOutput::blocked(failed))?;
            queue.extend(self.dependents_of(name).iter().map(String::as_str));
        }
        Ok(())
    }
}

fn record(
    ctx: &BuildContext,
    outputs: &mut HashMap<String, TaskOutput>,
    name: &str,
    output: TaskOutput,
) -> Result<(), ExtpackError> {
    ctx.outputs().record(name, output.clone())?;
    outputs.insert(name.to_string(), output);
    Ok(())
}

fn emit_for_task(ctx: &BuildContext, name: &str, kind: EventKind, data: serde_json::Value) {
    ctx.event_sink()
        .try_emit(BuildEvent::task(kind, ctx.run_id(), name).with_data(data));
}

async fn run_task(runner: Arc<dyn Task>, ctx: TaskContext) -> TaskOutput {
    ctx.emit(EventKind::TaskStarted, Some(json!({ "kind": runner.kind() })));
    let start = Instant::now();
    let mut output = runner.execute(&ctx).await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    // Only the scheduler may block a task.
    if output.status == TaskStatus::Blocked {
        output = TaskOutput::fail("task reported itself blocked");
    }

    let (kind, data) = match output.status {
        TaskStatus::Ok => (EventKind::TaskCompleted, json!({ "duration_ms": duration_ms })),
        TaskStatus::Skip => (EventKind::TaskSkipped, json!({ "reason": output.skip_reason })),
        TaskStatus::Cancel => (EventKind::TaskCancelled, json!({ "reason": output.cancel_reason })),
        _ => (
            EventKind::TaskFailed,
            json!({ "error": output.error, "duration_ms": duration_ms }),
        ),
    };
    ctx.emit(kind, Some(data));
    output
}

/// Orders tasks so every prerequisite precedes its dependents, visiting in
/// insertion order for determinism.
fn topological_sort(tasks: &HashMap<String, TaskSpec>, task_order: &[String]) -> Vec<String> {
    fn visit(
        node: &str,
        tasks: &HashMap<String, TaskSpec>,
        visited: &mut HashSet<String>,
        in_progress: &mut HashSet<String>,
        result: &mut Vec<String>,
    ) {
        if visited.contains(node) || in_progress.contains(node) {
            return;
        }
        in_progress.insert(node.to_string());
        if let Some(spec) = tasks.get(node) {
            for dep in &spec.dependencies {
                visit(dep, tasks, visited, in_progress, result);
            }
        }
        in_progress.remove(node);
        visited.insert(node.to_string());
        result.push(node.to_string());
    }

    let mut result = Vec::with_capacity(tasks.len());
    let mut visited = HashSet::new();
    let mut in_progress = HashSet::new();
    for name in task_order {
        visit(name, tasks, &mut visited, &mut in_progress, &mut result);
    }
    result
}
