//! `prepackage:<platform>:modifyManifest`.

use super::{finish, Task};
use crate::config::Platform;
use crate::context::TaskContext;
use crate::core::{TaskKind, TaskOutput};
use crate::errors::ExtpackError;
use crate::manifest::rewrite_file;
use async_trait::async_trait;
use serde_json::json;

/// Rewrites a platform's staged `manifest.json`.
#[derive(Debug, Clone)]
pub struct ModifyManifestTask {
    name: String,
    platform: Platform,
}

impl ModifyManifestTask {
    /// Creates the task for `platform`.
    #[must_use]
    pub fn new(name: impl Into<String>, platform: Platform) -> Self {
        Self {
            name: name.into(),
            platform,
        }
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, ExtpackError> {
        let path = self
            .platform
            .staging_dir(&ctx.config().dist_dir)
            .join("manifest.json");
        let doc = rewrite_file(&path, self.platform).await?;
        Ok(TaskOutput::ok_value(
            "background_scripts",
            json!(doc.background_scripts().unwrap_or_default()),
        ))
    }
}

#[async_trait]
impl Task for ModifyManifestTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Transform
    }

    async fn execute(&self, ctx: &TaskContext) -> TaskOutput {
        finish(self.run(ctx).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildConfig, ProjectLayout};
    use crate::core::TaskStatus;
    use crate::tasks::test_support::{task_context, touch};

    #[tokio::test]
    async fn test_malformed_manifest_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("dist");
        let staging = Platform::Firefox.staging_dir(&dist);
        touch(&staging, "manifest.json", "{ \"background\": ");

        let ctx = task_context(BuildConfig::new(&dist), ProjectLayout::for_root(dir.path()), "modify");
        let output = ModifyManifestTask::new("modify", Platform::Firefox).execute(&ctx).await;

        assert_eq!(output.status, TaskStatus::Fail);
        assert!(output.error.unwrap().starts_with("Invalid JSON"));
        assert_eq!(
            std::fs::read_to_string(staging.join("manifest.json")).unwrap(),
            "{ \"background\": "
        );
    }

    #[tokio::test]
    async fn test_rewrites_staged_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("dist");
        let staging = Platform::Edge.staging_dir(&dist);
        touch(
            &staging,
            "manifest.json",
            r#"{"background": {"scripts": ["background/chromeExtension.js"]}}"#,
        );

        let ctx = task_context(BuildConfig::new(&dist), ProjectLayout::for_root(dir.path()), "modify");
        let output = ModifyManifestTask::new("modify", Platform::Edge).execute(&ctx).await;

        assert_eq!(output.status, TaskStatus::Ok);
        assert_eq!(
            output.get("background_scripts"),
            Some(&json!(["background/edgeExtension.js"]))
        );
    }
}
