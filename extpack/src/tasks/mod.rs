//! Task trait and the build tasks.
//!
//! A task is one named unit of work in the build graph. Tasks never return
//! errors to the scheduler; every outcome is a [`TaskOutput`].

mod clean;
mod compile;
mod copy;
mod package;
mod strip;
mod transform;
mod vendor;
mod version;

pub use clean::{CleanDistTask, CleanSourcesTask};
pub use compile::{CompileTarget, CompileTask};
pub use copy::CopyTask;
pub use package::PackageTask;
pub use strip::StripTask;
pub use transform::ModifyManifestTask;
pub use vendor::VendorTask;
pub use version::VersionTask;

use crate::context::TaskContext;
use crate::core::{TaskKind, TaskOutput};
use crate::errors::ExtpackError;
use async_trait::async_trait;
use std::fmt::Debug;

/// A unit of work in the build graph.
#[async_trait]
pub trait Task: Send + Sync + Debug {
    /// The task's unique name, e.g. `prepackage:edge:copy`.
    fn name(&self) -> &str;

    /// What kind of work the task does.
    fn kind(&self) -> TaskKind {
        TaskKind::Group
    }

    /// Runs the task.
    async fn execute(&self, ctx: &TaskContext) -> TaskOutput;
}

/// Converts a task body's result into its output. Cancellation keeps its own
/// status; every other error fails the task.
pub(crate) fn finish(result: Result<TaskOutput, ExtpackError>) -> TaskOutput {
    match result {
        Ok(output) => output,
        Err(ExtpackError::Cancelled(reason)) => TaskOutput::cancel(reason),
        Err(e) => TaskOutput::fail(e.to_string()),
    }
}

/// A task that only aggregates its prerequisites.
#[derive(Debug, Clone)]
pub struct GroupTask {
    name: String,
}

impl GroupTask {
    /// Creates a group task.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Task for GroupTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &TaskContext) -> TaskOutput {
        TaskOutput::ok_empty()
    }
}

/// A task backed by a synchronous closure.
pub struct FnTask<F>
where
    F: Fn(&TaskContext) -> TaskOutput + Send + Sync,
{
    name: String,
    kind: TaskKind,
    func: F,
}

impl<F> FnTask<F>
where
    F: Fn(&TaskContext) -> TaskOutput + Send + Sync,
{
    /// Creates a closure task.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::Group,
            func,
        }
    }

    /// Sets the reported kind.
    #[must_use]
    pub fn with_kind(mut self, kind: TaskKind) -> Self {
        self.kind = kind;
        self
    }
}

impl<F> Debug for FnTask<F>
where
    F: Fn(&TaskContext) -> TaskOutput + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTask")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> Task for FnTask<F>
where
    F: Fn(&TaskContext) -> TaskOutput + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        self.kind
    }

    async fn execute(&self, ctx: &TaskContext) -> TaskOutput {
        (self.func)(ctx)
    }
}
