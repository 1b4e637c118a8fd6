//! `compile:ts` and `compile:less`: run external compilers over the source
//! tree.

use super::{finish, Task};
use crate::config::CommandSpec;
use crate::context::TaskContext;
use crate::core::{TaskKind, TaskOutput};
use crate::errors::ExtpackError;
use crate::fileset::select_files_async;
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Which configured compiler a [`CompileTask`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileTarget {
    /// The TypeScript compiler.
    TypeScript,
    /// The LESS compiler.
    Less,
}

/// Runs one configured compiler. Skips when none is configured.
#[derive(Debug, Clone)]
pub struct CompileTask {
    name: String,
    target: CompileTarget,
}

impl CompileTask {
    /// Creates the task.
    #[must_use]
    pub fn new(name: impl Into<String>, target: CompileTarget) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskOutput, ExtpackError> {
        let layout = ctx.layout();
        let spec = match self.target {
            CompileTarget::TypeScript => layout.compile.ts.as_ref(),
            CompileTarget::Less => layout.compile.less.as_ref(),
        };
        let Some(spec) = spec else {
            return Ok(TaskOutput::skip("no compiler configured"));
        };
        let src = layout.source_path();

        let runs = match &spec.inputs {
            None => {
                run_command(ctx, spec, &layout.root, &expand_args(spec, &src, None)).await?;
                1
            }
            Some(pattern) => {
                let inputs = select_files_async(src.clone(), vec![pattern.clone()]).await?;
                let extension = spec.output_extension.as_deref().unwrap_or_default();
                for rel in &inputs {
                    let input = src.join(rel);
                    let output = input.with_extension(extension);
                    let args = expand_args(spec, &src, Some((&input, &output)));
                    run_command(ctx, spec, &layout.root, &args).await?;
                }
                inputs.len()
            }
        };

        info!(task = %self.name, program = %spec.program, runs, "Compiled");
        Ok(TaskOutput::ok_value("runs", json!(runs)))
    }
}

/// Expands `{src}`, `{input}` and `{output}` in the command's arguments.
fn expand_args(spec: &CommandSpec, src: &Path, files: Option<(&Path, &Path)>) -> Vec<String> {
    let src = src.display().to_string();
    let (input, output) = files.map_or_else(
        || (String::new(), String::new()),
        |(i, o)| (i.display().to_string(), o.display().to_string()),
    );
    spec.args
        .iter()
        .map(|arg| {
            arg.replace("{src}", &src)
                .replace("{input}", &input)
                .replace("{output}", &output)
        })
        .collect()
}

async fn run_command(ctx: &TaskContext, spec: &CommandSpec, cwd: &Path, args: &[String]) -> Result<(), ExtpackError> {
    let command_line = std::iter::once(spec.program.as_str())
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    debug!(command = %command_line, "Running");

    let mut command = Command::new(&spec.program);
    command.args(args).current_dir(cwd).kill_on_drop(true);

    let cancellation = ctx.build().cancellation();
    let status = tokio::select! {
        status = command.status() => status.map_err(|e| ExtpackError::Command {
            command: command_line.clone(),
            message: e.to_string(),
        })?,
        () = cancellation.cancelled() => {
            return Err(ExtpackError::Cancelled(
                cancellation.reason().unwrap_or_else(|| "cancelled".to_string()),
            ));
        }
    };

    if status.success() {
        Ok(())
    } else {
        Err(ExtpackError::Command {
            command: command_line,
            message: format!("exited with {status}"),
        })
    }
}

#[async_trait]
impl Task for CompileTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Compile
    }

    async fn execute(&self, ctx: &TaskContext) -> TaskOutput {
        finish(self.run(ctx).await)
    }
}
