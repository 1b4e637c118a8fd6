//! Build configuration and project layout.
//!
//! This module provides:
//! - The immutable [`BuildConfig`] resolved from command-line overrides
//! - Target [`Platform`] definitions
//! - The [`ProjectLayout`] describing sources, file sets and external commands

mod build;
mod layout;
mod platform;

pub use build::{BuildConfig, ConfigOverrides};
pub use layout::{CommandSpec, CompileCommands, FileSet, ProjectLayout, StripSelection, VendorCopy};
pub use platform::Platform;
