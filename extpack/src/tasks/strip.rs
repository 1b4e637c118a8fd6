//! `prepackage:<platform>:strip`.

use super::{finish, Task};
use crate::config::Platform;
use crate::context::TaskContext;
use crate::core::{TaskKind, TaskOutput};
use crate::errors::ExtpackError;
use crate::fileset::select_files_async;
use crate::strip::{strip_file, StripReport};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::json;
use std::collections::HashMap;
use tracing::info;

/// Strips debug statements from a platform's staged scripts. Skips when the
/// build keeps debug code.
#[derive(Debug, Clone)]
pub struct StripTask {
    name: String,
    platform: Platform,
}

impl StripTask {
    /// Creates the task for `platform`.
    #[must_use]
    pub fn new(name: impl Into<String>, platform: Platform) -> Self {
        Self {
            name: name.into(),
            platform,
        }
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, ExtpackError> {
        if ctx.config().keep_debug {
            return Ok(TaskOutput::skip("keepDebug is set"));
        }

        let selection = &ctx.layout().strip;
        let staging = self.platform.staging_dir(&ctx.config().dist_dir);
        let patterns: Vec<String> = selection
            .include
            .iter()
            .cloned()
            .chain(selection.exclude.iter().map(|p| format!("!{p}")))
            .collect();
        let files = select_files_async(staging.clone(), patterns).await?;

        let reports = try_join_all(files.iter().map(|rel| {
            let path = staging.join(rel);
            async move { strip_file(&path).await }
        }))
        .await?;
        let mut total = StripReport::default();
        for report in reports {
            total.merge(report);
        }

        info!(
            task = %self.name,
            platform = %self.platform,
            files = files.len(),
            console_calls = total.console_calls,
            debugger_statements = total.debugger_statements,
            alert_calls = total.alert_calls,
            "Stripped debug statements"
        );
        let mut data = HashMap::new();
        data.insert("files".to_string(), json!(files.len()));
        data.insert("console_calls".to_string(), json!(total.console_calls));
        data.insert("debugger_statements".to_string(), json!(total.debugger_statements));
        data.insert("alert_calls".to_string(), json!(total.alert_calls));
        Ok(TaskOutput::ok(data))
    }
}

#[async_trait]
impl Task for StripTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Strip
    }

    async fn execute(&self, ctx: &TaskContext) -> TaskOutput {
        finish(self.run(ctx).await)
    }
}
