//! `version`: stamps the requested version into the source tree.

use super::{finish, Task};
use crate::context::TaskContext;
use crate::core::{TaskKind, TaskOutput};
use crate::errors::ExtpackError;
use crate::versioning::{pad_appx_version, patch_file, replace_appx_version, replace_version_entry};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use tracing::info;

/// Patches the version files and the Appx descriptor. Skips when no version
/// was requested.
#[derive(Debug, Clone)]
pub struct VersionTask {
    name: String,
}

impl VersionTask {
    /// Creates the task.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, ExtpackError> {
        let Some(version) = ctx.config().version.as_deref() else {
            return Ok(TaskOutput::skip("no version requested"));
        };
        let layout = ctx.layout();
        let src = layout.source_path();

        let mut patched = Vec::new();
        for rel in &layout.version_files {
            if patch_file(&src.join(rel), |text| replace_version_entry(text, version)).await? {
                patched.push(rel.clone());
            }
        }

        let appx_version = pad_appx_version(version);
        let appx = layout.appx_manifest_path();
        if patch_file(&appx, |text| replace_appx_version(text, &appx_version)).await? {
            patched.push(layout.appx_manifest.clone());
        }

        info!(task = %self.name, version, appx_version = %appx_version, patched = patched.len(), "Stamped version");
        let mut data = HashMap::new();
        data.insert("version".to_string(), json!(version));
        data.insert("appx_version".to_string(), json!(appx_version));
        data.insert("patched".to_string(), json!(patched));
        Ok(TaskOutput::ok(data))
    }
}

#[async_trait]
impl Task for VersionTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Version
    }

    async fn execute(&self, ctx: &TaskContext) -> TaskOutput {
        finish(self.run(ctx).await)
    }
}
