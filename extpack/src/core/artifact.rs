//! Build artifact type for recording produced archives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file produced by a task, such as a packaged archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArtifact {
    /// The artifact type (e.g., "zip", "xpi").
    #[serde(rename = "type")]
    pub artifact_type: String,

    /// Where the artifact was written.
    pub path: PathBuf,

    /// Size in bytes.
    pub bytes: u64,

    /// Hex-encoded SHA-256 of the file contents.
    pub sha256: String,

    /// When the artifact was created.
    pub created_at: DateTime<Utc>,
}

impl BuildArtifact {
    /// Creates a new build artifact.
    #[must_use]
    pub fn new(
        artifact_type: impl Into<String>,
        path: impl Into<PathBuf>,
        bytes: u64,
        sha256: impl Into<String>,
    ) -> Self {
        Self {
            artifact_type: artifact_type.into(),
            path: path.into(),
            bytes,
            sha256: sha256.into(),
            created_at: Utc::now(),
        }
    }

    /// Returns the artifact's file name.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Converts the artifact to a JSON value.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "type": self.artifact_type,
            "path": self.path.display().to_string(),
            "bytes": self.bytes,
            "sha256": self.sha256,
            "created_at": self.created_at.to_rfc3339(),
        })
    }
}
