//! `package:<platform>`: archives a staged platform.

use super::{finish, Task};
use crate::archive::zip_directory_async;
use crate::config::Platform;
use crate::context::TaskContext;
use crate::core::{TaskKind, TaskOutput};
use crate::errors::ExtpackError;
use crate::manifest::{archive_file_name, ManifestDocument};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

/// Zips the staging directory into `<dist>/<platform>/<name>-<version>.<ext>`.
///
/// Platforms without an archive format (Edge) ship the staged tree as is and
/// the task only reports where it is.
#[derive(Debug, Clone)]
pub struct PackageTask {
    name: String,
    platform: Platform,
}

impl PackageTask {
    /// Creates the task for `platform`.
    #[must_use]
    pub fn new(name: impl Into<String>, platform: Platform) -> Self {
        Self {
            name: name.into(),
            platform,
        }
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, ExtpackError> {
        let dist = &ctx.config().dist_dir;
        let staging = self.platform.staging_dir(dist);

        let Some(extension) = self.platform.archive_extension() else {
            info!(task = %self.name, staging = %staging.display(), "Package is the staged tree");
            return Ok(TaskOutput::ok_value("staging", json!(staging.display().to_string())));
        };

        let doc = ManifestDocument::read(&staging.join("manifest.json")).await?;
        let file_name = archive_file_name(&doc, self.platform)?;
        let target = self.platform.dist_dir(dist).join(&file_name);

        let artifact = zip_directory_async(staging, target, extension.to_string()).await?;
        Ok(TaskOutput::ok_value("archive", json!(file_name)).with_artifact(artifact))
    }
}

#[async_trait]
impl Task for PackageTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        if self.platform.archive_extension().is_some() {
            TaskKind::Archive
        } else {
            TaskKind::Group
        }
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

    fn run_ctx(root: &std::path::Path) -> TaskContext {
        task_context(BuildConfig::new(root.join("dist")), ProjectLayout::for_root(root), "package")
    }

    #[tokio::test]
    async fn test_chrome_archive_named_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Platform::Chrome.staging_dir(&dir.path().join("dist"));
        touch(&staging, "manifest.json", r#"{"short_name": "Foo", "version": "2.0.0"}"#);

        let output = PackageTask::new("package:chrome", Platform::Chrome)
            .execute(&run_ctx(dir.path()))
            .await;

        assert_eq!(output.status, TaskStatus::Ok);
        assert_eq!(output.get("archive"), Some(&json!("foo-2.0.0.zip")));
        assert_eq!(output.artifacts.len(), 1);
        assert!(dir.path().join("dist/chrome/foo-2.0.0.zip").is_file());
    }

    #[tokio::test]
    async fn test_missing_short_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Platform::Firefox.staging_dir(&dir.path().join("dist"));
        touch(&staging, "manifest.json", r#"{"version": "2.0.0"}"#);

        let output = PackageTask::new("package:firefox", Platform::Firefox)
            .execute(&run_ctx(dir.path()))
            .await;
        assert_eq!(output.status, TaskStatus::Fail);
        assert!(output.error.unwrap().contains("short_name"));
    }

    #[tokio::test]
    async fn test_missing_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let output = PackageTask::new("package:chrome", Platform::Chrome)
            .execute(&run_ctx(dir.path()))
            .await;
        assert_eq!(output.status, TaskStatus::Fail);
    }

    #[tokio::test]
    async fn test_edge_has_no_archive() {
        let dir = tempfile::tempdir().unwrap();
        let task = PackageTask::new("package:edge", Platform::Edge);
        assert_eq!(task.kind(), TaskKind::Group);

        let output = task.execute(&run_ctx(dir.path())).await;
        assert_eq!(output.status, TaskStatus::Ok);
        assert!(output.artifacts.is_empty());
    }
}
