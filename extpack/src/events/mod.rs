//! Build events.
//!
//! The task graph reports every state change as a [`BuildEvent`] to the
//! [`EventSink`] carried by the build context. Sinks decide what to do with
//! them: drop them, log them, or keep them for inspection.

mod event;
mod sink;

pub use event::{BuildEvent, EventKind};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
