//! `lib`: copies third-party files into the source tree.

use super::{finish, Task};
use crate::config::VendorCopy;
use crate::context::TaskContext;
use crate::core::{TaskKind, TaskOutput};
use crate::errors::ExtpackError;
use crate::fileset::copy_file;
use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

/// Copies every configured [`VendorCopy`] into the vendor directory.
#[derive(Debug, Clone)]
pub struct VendorTask {
    name: String,
}

impl VendorTask {
    /// Creates the task.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, ExtpackError> {
        let layout = ctx.layout();
        let lib = layout.vendor_path();

        let copies = layout.vendor.iter().map(|entry| {
            let from = layout.root.join(&entry.from);
            let to = destination(&lib, entry);
            async move {
                if !from.is_file() {
                    return Err(ExtpackError::FileNotFound(from));
                }
                copy_file(&from, &to).await?;
                Ok::<_, ExtpackError>(to)
            }
        });
        let written = try_join_all(copies).await?;

        info!(task = %self.name, copied = written.len(), lib = %lib.display(), "Copied vendor files");
        let written: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
        Ok(TaskOutput::ok_value("copied", json!(written)))
    }
}

fn destination(lib: &Path, entry: &VendorCopy) -> PathBuf {
    let mut to = lib.to_path_buf();
    if let Some(subdir) = &entry.subdir {
        to.push(subdir);
    }
    match &entry.rename {
        Some(name) => to.push(name),
        None => to.push(Path::new(&entry.from).file_name().unwrap_or_default()),
    }
    to
}

#[async_trait]
impl Task for VendorTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Vendor
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

    #[test]
    fn test_destination() {
        let lib = Path::new("/p/src/lib");
        assert_eq!(
            destination(lib, &VendorCopy::new("node_modules/jquery/dist/jquery.min.js")),
            PathBuf::from("/p/src/lib/jquery.min.js")
        );
        assert_eq!(
            destination(lib, &VendorCopy::new("a/b.js").renamed("c.js")),
            PathBuf::from("/p/src/lib/c.js")
        );
        assert_eq!(
            destination(lib, &VendorCopy::new("a/b.css").into_subdir("select2")),
            PathBuf::from("/p/src/lib/select2/b.css")
        );
    }

    #[tokio::test]
    async fn test_default_vendor_copies() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "node_modules/jquery/dist/jquery.min.js", "jq");
        touch(root, "node_modules/ms-signalr-client/jquery.signalR-2.2.1.min.js", "sr");
        touch(root, "node_modules/select2/dist/js/select2.full.min.js", "s2");
        touch(root, "node_modules/select2/dist/css/select2.min.css", "s2css");

        let ctx = task_context(BuildConfig::new(root.join("dist")), ProjectLayout::for_root(root), "lib");
        let output = VendorTask::new("lib").execute(&ctx).await;
        assert_eq!(output.status, TaskStatus::Ok);

        let lib = root.join("src/lib");
        assert!(lib.join("jquery.min.js").is_file());
        assert_eq!(std::fs::read_to_string(lib.join("jquery.signalr.min.js")).unwrap(), "sr");
        assert!(lib.join("select2/select2.full.min.js").is_file());
        assert!(lib.join("select2/select2.min.css").is_file());
    }

    #[tokio::test]
    async fn test_missing_vendor_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = task_context(
            BuildConfig::new(dir.path().join("dist")),
            ProjectLayout::for_root(dir.path()),
            "lib",
        );

        let output = VendorTask::new("lib").execute(&ctx).await;
        assert_eq!(output.status, TaskStatus::Fail);
        assert!(output.error.unwrap().contains("File not found"));
    }
}
