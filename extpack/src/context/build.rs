//! Build and task contexts.

use super::OutputBag;
use crate::cancellation::CancellationToken;
use crate::config::{BuildConfig, ProjectLayout};
use crate::events::{BuildEvent, EventKind, EventSink, LoggingEventSink};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// State shared by every task of one build run.
///
/// Configuration and layout are immutable once the run starts. Tasks
/// communicate only through the filesystem and the [`OutputBag`].
pub struct BuildContext {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    config: Arc<BuildConfig>,
    layout: Arc<ProjectLayout>,
    event_sink: Arc<dyn EventSink>,
    cancel: Arc<CancellationToken>,
    outputs: OutputBag,
}

impl BuildContext {
    /// Creates a context with a fresh run ID and a logging event sink.
    #[must_use]
    pub fn new(config: BuildConfig, layout: ProjectLayout) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            config: Arc::new(config),
            layout: Arc::new(layout),
            event_sink: Arc::new(LoggingEventSink),
            cancel: Arc::new(CancellationToken::new()),
            outputs: OutputBag::new(),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Shares an externally owned cancellation token, e.g. one wired to Ctrl-C.
    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancel = token;
        self
    }

    /// The run ID.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// When the context was created.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// The build configuration.
    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// The project layout.
    #[must_use]
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// The event sink.
    #[must_use]
    pub fn event_sink(&self) -> &Arc<dyn EventSink> {
        &self.event_sink
    }

    /// The cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &Arc<CancellationToken> {
        &self.cancel
    }

    /// Recorded task outputs.
    #[must_use]
    pub const fn outputs(&self) -> &OutputBag {
        &self.outputs
    }

    /// Returns whether the build has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Emits a build-level event.
    pub fn emit(&self, kind: EventKind, data: Option<serde_json::Value>) {
        let mut event = BuildEvent::build(kind, self.run_id);
        event.data = data;
        self.event_sink.try_emit(event);
    }
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .field("cancelled", &self.is_cancelled())
            .field("outputs", &self.outputs.len())
            .finish_non_exhaustive()
    }
}

/// A single task's view of the build.
#[derive(Clone)]
pub struct TaskContext {
    build: Arc<BuildContext>,
    task_name: String,
}

impl TaskContext {
    /// Creates the context for `task_name`.
    #[must_use]
    pub fn new(build: Arc<BuildContext>, task_name: impl Into<String>) -> Self {
        Self {
            build,
            task_name: task_name.into(),
        }
    }

    /// The task's name.
    #[must_use]
    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    /// The surrounding build.
    #[must_use]
    pub const fn build(&self) -> &Arc<BuildContext> {
        &self.build
    }

    /// The build configuration.
    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        self.build.config()
    }

    /// The project layout.
    #[must_use]
    pub fn layout(&self) -> &ProjectLayout {
        self.build.layout()
    }

    /// Returns whether the build has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.build.is_cancelled()
    }

    /// Emits an event tagged with this task's name.
    pub fn emit(&self, kind: EventKind, data: Option<serde_json::Value>) {
        let mut event = BuildEvent::task(kind, self.build.run_id(), &self.task_name);
        event.data = data;
        self.build.event_sink().try_emit(event);
    }
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext")
            .field("task_name", &self.task_name)
            .field("run_id", &self.build.run_id())
            .finish()
    }
}
