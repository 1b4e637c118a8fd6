//! extpack - package a browser extension for Chrome, Firefox and Edge.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use extpack::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

/// extpack - package a browser extension for Chrome, Firefox and Edge
#[derive(Parser, Debug)]
#[command(name = "extpack")]
#[command(about, long_about = None)]
struct Cli {
    /// Task to run; only its prerequisites are executed
    #[arg(default_value = DEFAULT_TARGET)]
    target: String,

    /// Version to stamp into the sources (1 to 4 dot-separated integers)
    #[arg(long = "version")]
    version: Option<String>,

    /// Output directory, relative to the project root
    #[arg(long = "distDir", alias = "dist-dir")]
    dist_dir: Option<PathBuf>,

    /// Keep console.* calls and debugger statements
    #[arg(
        long = "keepDebug",
        alias = "keep-debug",
        num_args = 0..=1,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    keep_debug: Option<bool>,

    /// Project root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// JSON project layout, relative to the project root
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Start no new tasks after the first failure
    #[arg(long)]
    fail_fast: bool,

    /// Print the task names in execution order and exit
    #[arg(long)]
    list: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let failure_mode = if cli.fail_fast {
        FailureMode::FailFast
    } else {
        FailureMode::ContinueOnFailure
    };
    let graph = standard_graph()?.with_failure_mode(failure_mode);
    if cli.list {
        for name in graph.execution_order() {
            println!("{name}");
        }
        return Ok(ExitCode::SUCCESS);
    }
    let graph = graph.subgraph(&cli.target)?;

    let root = std::path::absolute(&cli.root)
        .with_context(|| format!("Failed to resolve project root {}", cli.root.display()))?;
    let layout = match &cli.layout {
        Some(path) => ProjectLayout::load(&root.join(path))?,
        None => ProjectLayout::for_root(&root),
    };
    let config = ConfigOverrides {
        dist_dir: cli.dist_dir,
        version: cli.version,
        keep_debug: cli.keep_debug,
    }
    .resolve(&root)?;

    info!(
        config = %serde_json::to_string(&config)?,
        target = %cli.target,
        tasks = graph.task_count(),
        "Start build"
    );

    let token = Arc::new(CancellationToken::new());
    let signal_token = Arc::clone(&token);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling build");
            signal_token.cancel("interrupted");
        }
    });

    let ctx = Arc::new(BuildContext::new(config, layout).with_cancellation(token));
    let result = graph.execute(ctx).await?;

    for artifact in result.artifacts() {
        info!(
            path = %artifact.path.display(),
            bytes = artifact.bytes,
            sha256 = %artifact.sha256,
            "Wrote package"
        );
    }

    if result.success {
        info!(duration_ms = result.duration_ms, "Build finished");
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            error = result.error.as_deref().unwrap_or("unknown error"),
            failed = ?result.failed_tasks(),
            blocked = ?result.blocked_tasks(),
            "Build failed"
        );
        Ok(ExitCode::FAILURE)
    }
}
