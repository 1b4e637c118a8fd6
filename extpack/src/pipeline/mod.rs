//! Task graph building and execution.
//!
//! - [`TaskSpec`]: a task plus its prerequisites
//! - [`PipelineBuilder`]: validated graph construction
//! - [`TaskGraph`]: concurrent DAG execution with blocking and cancellation
//! - [`FailureMode`]: whether unrelated branches keep running after a failure

mod builder;
mod dag;
mod failure;
mod spec;

#[cfg(test)]
mod integration_tests;

pub use builder::PipelineBuilder;
pub use dag::{GraphExecutionResult, TaskGraph};
pub use failure::FailureMode;
pub use spec::TaskSpec;
