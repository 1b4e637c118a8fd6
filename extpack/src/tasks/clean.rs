//! `clean:sources` and `clean:dist`.
//!
//! Both are best effort: anything that cannot be deleted is logged and the
//! task still succeeds.

use super::{finish, Task};
use crate::context::TaskContext;
use crate::core::{TaskKind, TaskOutput};
use crate::errors::ExtpackError;
use crate::fileset::{remove_dir_best_effort, remove_matching};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

/// Deletes compiled artefacts from the source tree.
#[derive(Debug, Clone)]
pub struct CleanSourcesTask {
    name: String,
}

impl CleanSourcesTask {
    /// Creates the task.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, ExtpackError> {
        let base = ctx.layout().source_path();
        let patterns = ctx.layout().clean_patterns.clone();
        let removed = tokio::task::spawn_blocking(move || remove_matching(&base, &patterns))
            .await
            .map_err(|e| ExtpackError::Internal(format!("Task join error: {e}")))??;

        info!(task = %self.name, removed, "Cleaned sources");
        Ok(TaskOutput::ok_value("removed", json!(removed)))
    }
}

#[async_trait]
impl Task for CleanSourcesTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Clean
    }

    async fn execute(&self, ctx: &TaskContext) -> TaskOutput {
        finish(self.run(ctx).await)
    }
}

/// Removes the whole dist directory.
#[derive(Debug, Clone)]
pub struct CleanDistTask {
    name: String,
}

impl CleanDistTask {
    /// Creates the task.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Task for CleanDistTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Clean
    }

    async fn execute(&self, ctx: &TaskContext) -> TaskOutput {
        let dist = &ctx.config().dist_dir;
        let removed = remove_dir_best_effort(dist).await;
        info!(task = %self.name, dist = %dist.display(), removed, "Cleaned dist");
        TaskOutput::ok_value("removed", json!(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildConfig, ProjectLayout};
    use crate::tasks::test_support::{task_context, touch};

    #[tokio::test]
    async fn test_clean_sources_removes_compiled_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        touch(&src, "background/chromeExtension.ts", "ts");
        touch(&src, "background/chromeExtension.js", "js");
        touch(&src, "css/popup.less", "less");
        touch(&src, "css/popup.css", "css");
        touch(&src, "lib/jquery.min.js", "lib");
        touch(&src, "manifest.json", "{}");

        let ctx = task_context(
            BuildConfig::new(dir.path().join("dist")),
            ProjectLayout::for_root(dir.path()),
            "clean:sources",
        );
        let output = CleanSourcesTask::new("clean:sources").execute(&ctx).await;

        assert!(output.is_success());
        assert_eq!(output.get("removed"), Some(&json!(3)));
        assert!(src.join("background/chromeExtension.ts").is_file());
        assert!(src.join("css/popup.less").is_file());
        assert!(src.join("manifest.json").is_file());
        assert!(!src.join("css/popup.css").exists());
        assert!(!src.join("lib/jquery.min.js").exists());
    }

    #[tokio::test]
    async fn test_clean_dist_absent_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = task_context(
            BuildConfig::new(dir.path().join("dist")),
            ProjectLayout::for_root(dir.path()),
            "clean:dist",
        );

        let output = CleanDistTask::new("clean:dist").execute(&ctx).await;
        assert!(output.is_success());
        assert_eq!(output.get("removed"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn test_clean_dist_removes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("dist");
        touch(&dist, "chrome/unpacked/manifest.json", "{}");

        let ctx = task_context(BuildConfig::new(&dist), ProjectLayout::for_root(dir.path()), "clean:dist");
        CleanDistTask::new("clean:dist").execute(&ctx).await;
        assert!(!dist.exists());
    }
}
