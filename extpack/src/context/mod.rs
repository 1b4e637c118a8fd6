//! Context passed to every task.
//!
//! This module provides:
//! - [`BuildContext`]: one per run, holding configuration, layout, the event
//!   sink, the cancellation token and recorded task outputs
//! - [`TaskContext`]: a task's view of the build
//! - [`OutputBag`]: thread-safe storage for finished task outputs

mod build;
#[cfg(test)]
mod context_tests;
mod outputs;

pub use build::{BuildContext, TaskContext};
pub use outputs::OutputBag;
