//! The standard extension build graph.
//!
//! ```text
//! version, clean:sources, clean:dist -> clean
//! lib, compile:ts, compile:less      -> compile
//! prepackage:<p>:copy -> strip, modifyManifest -> prepackage:<p> -> package:<p>
//! package:* + version -> build -> default
//! ```

use crate::config::Platform;
use crate::errors::PipelineValidationError;
use crate::pipeline::{PipelineBuilder, TaskGraph};
use crate::tasks::{
    CleanDistTask, CleanSourcesTask, CompileTarget, CompileTask, CopyTask, GroupTask, ModifyManifestTask,
    PackageTask, StripTask, Task, VendorTask, VersionTask,
};
use std::sync::Arc;

/// Target run when none is named.
pub const DEFAULT_TARGET: &str = "build";

fn task(runner: impl Task + 'static) -> Arc<dyn Task> {
    Arc::new(runner)
}

/// Adds `prepackage:<p>:*`, `prepackage:<p>` and `package:<p>` for one platform.
fn add_platform(builder: PipelineBuilder, platform: Platform) -> Result<PipelineBuilder, PipelineValidationError> {
    let p = platform.id();
    let copy = format!("prepackage:{p}:copy");
    let strip = format!("prepackage:{p}:strip");
    let modify = format!("prepackage:{p}:modifyManifest");
    let prepackage = format!("prepackage:{p}");

    let mut builder = builder
        .task(
            task(CopyTask::new(copy.as_str(), platform)),
            &["clean:dist", "compile", "lib", "version"],
        )?
        .task(task(StripTask::new(strip.as_str(), platform)), &[copy.as_str()])?;

    let mut staged = vec![copy.as_str(), strip.as_str()];
    if platform.rewrites_manifest() {
        builder = builder.task(task(ModifyManifestTask::new(modify.as_str(), platform)), &[copy.as_str()])?;
        staged.push(modify.as_str());
    }

    builder
        .task(task(GroupTask::new(prepackage.as_str())), &staged)?
        .task(
            task(PackageTask::new(format!("package:{p}"), platform)),
            &[prepackage.as_str()],
        )
}

/// Returns a builder holding every task of the standard build.
///
/// # Errors
///
/// Returns an error only if the graph definition itself is inconsistent.
pub fn standard_builder() -> Result<PipelineBuilder, PipelineValidationError> {
    let mut builder = PipelineBuilder::new("extpack")
        .task(task(VersionTask::new("version")), &[])?
        .task(task(CleanSourcesTask::new("clean:sources")), &[])?
        .task(task(CleanDistTask::new("clean:dist")), &[])?
        .task(task(GroupTask::new("clean")), &["clean:sources", "clean:dist"])?
        .task(task(VendorTask::new("lib")), &["clean:sources"])?
        .task(
            task(CompileTask::new("compile:ts", CompileTarget::TypeScript)),
            &["clean:sources", "version"],
        )?
        .task(task(CompileTask::new("compile:less", CompileTarget::Less)), &["clean:sources"])?
        .task(task(GroupTask::new("compile")), &["compile:ts", "compile:less"])?;

    for platform in Platform::ALL {
        builder = add_platform(builder, platform)?;
    }

    builder
        .task(
            task(GroupTask::new("build")),
            &["version", "package:chrome", "package:firefox", "package:edge"],
        )?
        .task(task(GroupTask::new("default")), &["build"])
}

/// Builds the standard graph.
///
/// # Errors
///
/// See [`standard_builder`].
pub fn standard_graph() -> Result<TaskGraph, PipelineValidationError> {
    standard_builder()?.build()
}
