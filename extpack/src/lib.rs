//! # Extpack
//!
//! A task-graph build orchestrator that packages one browser extension source
//! tree for Chrome, Firefox and Edge.
//!
//! A build is a DAG of named tasks:
//!
//! - **Preparation**: patch the version, clean old outputs, copy vendor
//!   libraries, run the TypeScript and LESS compilers
//! - **Staging**: copy the common and platform file sets into per-platform
//!   staging directories
//! - **Transformation**: strip debug statements and rewrite the staged manifest
//! - **Archival**: zip the staged tree as `<short_name>-<version>.zip`/`.xpi`
//!
//! Independent branches run concurrently; a failed task blocks only the tasks
//! downstream of it.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use extpack::prelude::*;
//!
//! let config = ConfigOverrides::default().resolve(&root)?;
//! let ctx = Arc::new(BuildContext::new(config, ProjectLayout::for_root(&root)));
//!
//! let graph = standard_graph()?.subgraph("build")?;
//! let result = graph.execute(ctx).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod archive;
pub mod cancellation;
pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod fileset;
pub mod manifest;
pub mod pipeline;
pub mod plan;
pub mod strip;
pub mod tasks;
pub mod versioning;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{BuildConfig, ConfigOverrides, FileSet, Platform, ProjectLayout};
    pub use crate::context::{BuildContext, OutputBag, TaskContext};
    pub use crate::core::{BuildArtifact, TaskKind, TaskOutput, TaskStatus};
    pub use crate::errors::{
        ConfigError, ContractErrorInfo, CycleDetectedError, ExtpackError, ManifestError,
        PipelineValidationError,
    };
    pub use crate::events::{
        BuildEvent, CollectingEventSink, EventKind, EventSink, LoggingEventSink, NoOpEventSink,
    };
    pub use crate::manifest::ManifestDocument;
    pub use crate::pipeline::{FailureMode, GraphExecutionResult, PipelineBuilder, TaskGraph, TaskSpec};
    pub use crate::plan::{standard_builder, standard_graph, DEFAULT_TARGET};
    pub use crate::tasks::{GroupTask, Task};
}
