//! Error types for the extpack build orchestrator.
//!
//! Graph validation errors carry a [`ContractErrorInfo`] with a stable code and
//! a fix hint; runtime errors are grouped by the stage of the build that
//! raised them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The main error type for extpack operations.
#[derive(Debug, Error)]
pub enum ExtpackError {
    /// The build configuration could not be resolved.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A manifest could not be read, transformed or written.
    #[error("{0}")]
    Manifest(#[from] ManifestError),

    /// A glob pattern was invalid.
    #[error("Invalid glob pattern '{pattern}': {message}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// The parser message.
        message: String,
    },

    /// A non-glob source path matched no file.
    #[error("File not found with singular glob: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An external command failed.
    #[error("Command `{command}` failed: {message}")]
    Command {
        /// The command line that was run.
        command: String,
        /// Exit status or spawn error.
        message: String,
    },

    /// Archive creation failed.
    #[error("Archive error: {0}")]
    Archive(String),

    /// A cancellation occurred.
    #[error("Build cancelled: {0}")]
    Cancelled(String),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error with the path involved.
    #[error("IO error at {}: {source}", path.display())]
    PathIo {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtpackError {
    /// Wraps an IO error with the path that caused it.
    #[must_use]
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PathIo {
            path: path.into(),
            source,
        }
    }
}

impl From<walkdir::Error> for ExtpackError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let message = err.to_string();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other(message));
        Self::io_at(path, source)
    }
}

impl From<zip::result::ZipError> for ExtpackError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

/// Errors raised while resolving the build configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The version string is not 1-4 dot-separated integers.
    #[error("Invalid version '{0}': expected 1 to 4 dot-separated integers")]
    InvalidVersion(String),

    /// The layout file could not be parsed.
    #[error("Invalid layout file {path}: {message}")]
    InvalidLayout {
        /// Layout file path.
        path: String,
        /// Parser message.
        message: String,
    },
}

/// Errors raised while handling a manifest document.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The document is not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The document root is not a JSON object.
    #[error("Invalid manifest: root must be a JSON object")]
    NotAnObject,

    /// A required field is absent, empty or has the wrong type.
    #[error("Manifest field '{0}' is missing or invalid")]
    MissingField(String),
}

/// Metadata about a contract error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "GRAPH-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when task graph validation fails.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The tasks involved in the error.
    pub tasks: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tasks: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the tasks involved.
    #[must_use]
    pub fn with_tasks(mut self, tasks: Vec<String>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the contract code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }
}

/// Error raised when a cycle is detected in the task graph.
#[derive(Debug, Clone, Error)]
#[error("Cycle detected in task graph: {}", cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The path of tasks forming the cycle.
    pub cycle_path: Vec<String>,
    /// Contract error info.
    pub error_info: ContractErrorInfo,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(cycle_path: Vec<String>) -> Self {
        let info = ContractErrorInfo::new(
            "GRAPH-CYCLE",
            format!("Task graph contains a dependency cycle: {}", cycle_path.join(" -> ")),
        )
        .with_fix_hint("Remove one of the dependencies in the cycle to break it.");

        Self {
            cycle_path,
            error_info: info,
        }
    }
}

impl From<CycleDetectedError> for PipelineValidationError {
    fn from(err: CycleDetectedError) -> Self {
        Self {
            message: err.to_string(),
            tasks: err.cycle_path.clone(),
            error_info: Some(err.error_info),
        }
    }
}
