//! Core domain model types for extpack.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Task status and kind enums
//! - Task output type with factory methods
//! - Build artifacts

mod artifact;
mod output;
mod status;

pub use artifact::BuildArtifact;
pub use output::TaskOutput;
pub use status::{TaskKind, TaskStatus};
