//! `prepackage:<platform>:copy`: assembles a platform's staging directory.

use super::{finish, Task};
use crate::config::Platform;
use crate::context::TaskContext;
use crate::core::{TaskKind, TaskOutput};
use crate::errors::ExtpackError;
use crate::fileset::{copy_file, copy_flattened, copy_tree, select_files_async};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use tracing::info;

/// Copies the common and platform file sets into the staging directory,
/// keeping source-relative paths.
///
/// Edge also gets its bridge scripts flattened into the staging root and the
/// Appx descriptor next to the staging directory; the three copies run
/// concurrently.
#[derive(Debug, Clone)]
pub struct CopyTask {
    name: String,
    platform: Platform,
}

impl CopyTask {
    /// Creates the task for `platform`.
    #[must_use]
    pub fn new(name: impl Into<String>, platform: Platform) -> Self {
        Self {
            name: name.into(),
            platform,
        }
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, ExtpackError> {
        let layout = ctx.layout();
        let src = layout.source_path();
        let dist = &ctx.config().dist_dir;
        let staging = self.platform.staging_dir(dist);

        let files = select_files_async(src.clone(), layout.files.patterns_for(self.platform)).await?;

        let mut data = HashMap::new();
        if self.platform == Platform::Edge {
            let bridges = select_files_async(src.clone(), layout.edge_bridges.clone()).await?;
            let appx_from = layout.appx_manifest_path();
            let appx_to = self.platform.dist_dir(dist).join(&layout.appx_manifest);

            let (copied, bridged, _) = tokio::try_join!(
                copy_tree(&src, &files, &staging),
                copy_flattened(&src, &bridges, &staging),
                async {
                    if !appx_from.is_file() {
                        return Err(ExtpackError::FileNotFound(appx_from.clone()));
                    }
                    copy_file(&appx_from, &appx_to).await
                },
            )?;
            data.insert("copied".to_string(), json!(copied));
            data.insert("bridges".to_string(), json!(bridged));
            data.insert("appx_manifest".to_string(), json!(appx_to.display().to_string()));
        } else {
            let copied = copy_tree(&src, &files, &staging).await?;
            data.insert("copied".to_string(), json!(copied));
        }
        data.insert("staging".to_string(), json!(staging.display().to_string()));

        info!(
            task = %self.name,
            platform = %self.platform,
            files = files.len(),
            staging = %staging.display(),
            "Staged files"
        );
        Ok(TaskOutput::ok(data))
    }
}

#[async_trait]
impl Task for CopyTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Copy
    }

    async fn execute(&self, ctx: &TaskContext) -> TaskOutput {
        finish(self.run(ctx).await)
    }
}
