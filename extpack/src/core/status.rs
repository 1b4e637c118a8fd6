//! Task status and kind enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of work a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Deletes build outputs.
    Clean,
    /// Patches version strings in the source tree.
    Version,
    /// Copies third-party libraries into the source tree.
    Vendor,
    /// Runs an external compiler.
    Compile,
    /// Assembles files into a staging directory.
    Copy,
    /// Strips debug statements from staged scripts.
    Strip,
    /// Rewrites a staged manifest.
    Transform,
    /// Compresses a staging directory.
    Archive,
    /// Only aggregates its prerequisites.
    #[default]
    Group,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Version => write!(f, "version"),
            Self::Vendor => write!(f, "vendor"),
            Self::Compile => write!(f, "compile"),
            Self::Copy => write!(f, "copy"),
            Self::Strip => write!(f, "strip"),
            Self::Transform => write!(f, "transform"),
            Self::Archive => write!(f, "archive"),
            Self::Group => write!(f, "group"),
        }
    }
}

/// The execution status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task completed successfully.
    Ok,
    /// Task had nothing to do.
    Skip,
    /// Task was cancelled.
    Cancel,
    /// Task failed.
    Fail,
    /// Task never ran because a prerequisite failed.
    Blocked,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Skip => write!(f, "skip"),
            Self::Cancel => write!(f, "cancel"),
            Self::Fail => write!(f, "fail"),
            Self::Blocked => write!(f, "blocked"),
        }
    }
}

impl TaskStatus {
    /// Returns true if dependents may run after this status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Ok | Self::Skip)
    }

    /// Returns true if the status indicates failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Fail | Self::Cancel)
    }
}
