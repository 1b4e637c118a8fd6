//! Event sink trait and implementations.

use super::{BuildEvent, EventKind};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

/// Receives build events.
///
/// Emission must never fail the build; sinks swallow their own errors.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: BuildEvent);

    /// Emits an event without awaiting.
    fn try_emit(&self, event: BuildEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: BuildEvent) {}

    fn try_emit(&self, _event: BuildEvent) {}
}

/// Writes events to `tracing`.
///
/// Failures log at `error`, blocked and cancelled tasks at `warn`, task starts
/// at `debug` and everything else at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventSink;

impl LoggingEventSink {
    fn log_event(event: &BuildEvent) {
        let task = event.task.as_deref().unwrap_or("-");
        let data = event.data.as_ref().map(ToString::to_string).unwrap_or_default();
        match event.kind {
            EventKind::TaskFailed => {
                error!(event = %event.kind, run_id = %event.run_id, task, data = %data, "Task failed: {}", task);
            }
            EventKind::TaskBlocked | EventKind::TaskCancelled => {
                warn!(event = %event.kind, run_id = %event.run_id, task, data = %data, "Event: {}", event.kind);
            }
            EventKind::TaskStarted => {
                debug!(event = %event.kind, run_id = %event.run_id, task, "Starting '{}'", task);
            }
            _ => {
                info!(event = %event.kind, run_id = %event.run_id, task, data = %data, "Event: {}", event.kind);
            }
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: BuildEvent) {
        Self::log_event(&event);
    }

    fn try_emit(&self, event: BuildEvent) {
        Self::log_event(&event);
    }
}

/// Keeps every event in memory for later inspection.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<BuildEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<BuildEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Returns the names of tasks that produced events of `kind`, in order.
    #[must_use]
    pub fn tasks_with(&self, kind: EventKind) -> Vec<String> {
        self.events
            .read()
            .iter()
            .filter(|e| e.kind == kind)
            .filter_map(|e| e.task.clone())
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: BuildEvent) {
        self.events.write().push(event);
    }

    fn try_emit(&self, event: BuildEvent) {
        self.events.write().push(event);
    }
}
