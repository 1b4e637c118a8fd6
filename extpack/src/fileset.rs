//! File selection by glob and the copy/delete primitives built on it.
//!
//! Patterns are matched against `/`-separated paths relative to a base
//! directory. `*` stays within one path segment, `**` spans any number of
//! segments, and a leading `!` turns a pattern into an exclusion. A pattern
//! without glob metacharacters names one file, which must exist.

use crate::errors::ExtpackError;
use futures::future::try_join_all;
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

fn is_glob(pattern: &str) -> bool {
    pattern.contains(|c: char| matches!(c, '*' | '?' | '[' | '{'))
}

fn compile_glob(pattern: &str) -> Result<Glob, ExtpackError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| ExtpackError::Pattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

fn build_globset<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<GlobSet, ExtpackError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile_glob(pattern)?);
    }
    builder.build().map_err(|e| ExtpackError::Pattern {
        pattern: "<set>".to_string(),
        message: e.to_string(),
    })
}

/// Returns `path` relative to `base` with `/` separators.
#[must_use]
pub fn normalize_rel(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// Lists every file under `base`, sorted, as normalized relative paths. A
/// missing `base` has no files; an unreadable entry is an error.
fn walk_files(base: &Path) -> Result<Vec<String>, ExtpackError> {
    if !base.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in WalkDir::new(base).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            out.extend(normalize_rel(base, entry.path()));
        }
    }
    out.sort();
    Ok(out)
}

/// Resolves `patterns` against `base`.
///
/// Results keep pattern order (each glob's matches sorted) and contain every
/// file once.
///
/// # Errors
///
/// Returns [`ExtpackError::FileNotFound`] when a non-glob pattern names a
/// missing file, [`ExtpackError::Pattern`] for an invalid glob, or
/// [`ExtpackError::PathIo`] when part of the tree cannot be read.
pub fn select_files(base: &Path, patterns: &[String]) -> Result<Vec<String>, ExtpackError> {
    let (excludes, includes): (Vec<&str>, Vec<&str>) = patterns
        .iter()
        .map(String::as_str)
        .partition(|p| p.starts_with('!'));
    let exclude = build_globset(excludes.iter().map(|p| &p[1..]))?;

    let mut all_files: Option<Vec<String>> = None;
    let mut seen = HashSet::new();
    let mut selected = Vec::new();

    for pattern in includes {
        let matches = if is_glob(pattern) {
            let glob = compile_glob(pattern)?.compile_matcher();
            if all_files.is_none() {
                all_files = Some(walk_files(base)?);
            }
            all_files
                .iter()
                .flatten()
                .filter(|rel| glob.is_match(rel.as_str()))
                .cloned()
                .collect::<Vec<_>>()
        } else {
            let path = base.join(pattern);
            if !path.is_file() {
                return Err(ExtpackError::FileNotFound(path));
            }
            vec![pattern.trim_start_matches("./").to_string()]
        };

        for rel in matches {
            if !exclude.is_match(&rel) && seen.insert(rel.clone()) {
                selected.push(rel);
            }
        }
    }

    debug!(base = %base.display(), count = selected.len(), "Selected files");
    Ok(selected)
}

/// Runs [`select_files`] on the blocking pool.
///
/// # Errors
///
/// See [`select_files`].
pub async fn select_files_async(base: PathBuf, patterns: Vec<String>) -> Result<Vec<String>, ExtpackError> {
    tokio::task::spawn_blocking(move || select_files(&base, &patterns))
        .await
        .map_err(|e| ExtpackError::Internal(format!("Task join error: {e}")))?
}

/// Copies one file, creating the destination's parent directories.
///
/// # Errors
///
/// Returns an error naming the path that could not be read or written.
pub async fn copy_file(from: &Path, to: &Path) -> Result<u64, ExtpackError> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ExtpackError::io_at(parent, e))?;
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| ExtpackError::io_at(from, e))
}

/// Copies `files` (relative to `base`) into `dest`, keeping relative paths.
///
/// # Errors
///
/// Fails on the first copy error.
pub async fn copy_tree(base: &Path, files: &[String], dest: &Path) -> Result<usize, ExtpackError> {
    try_join_all(files.iter().map(|rel| {
        let from = base.join(rel);
        let to = dest.join(rel);
        async move { copy_file(&from, &to).await }
    }))
    .await?;
    Ok(files.len())
}

/// Copies `files` (relative to `base`) directly into `dest`, dropping their
/// directories.
///
/// # Errors
///
/// Fails on the first copy error.
pub async fn copy_flattened(base: &Path, files: &[String], dest: &Path) -> Result<usize, ExtpackError> {
    try_join_all(files.iter().map(|rel| {
        let from = base.join(rel);
        let name = Path::new(rel)
            .file_name()
            .map_or_else(|| PathBuf::from(rel), PathBuf::from);
        let to = dest.join(name);
        async move { copy_file(&from, &to).await }
    }))
    .await?;
    Ok(files.len())
}

/// Deletes files and directories under `base` matching `patterns`.
///
/// Best effort: errors are logged and the walk continues. Returns how many
/// entries were removed.
///
/// # Errors
///
/// Only an invalid pattern is an error.
pub fn remove_matching(base: &Path, patterns: &[String]) -> Result<usize, ExtpackError> {
    let set = build_globset(patterns.iter().map(String::as_str))?;
    if !base.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    let mut walker = WalkDir::new(base).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let Some(rel) = normalize_rel(base, entry.path()) else {
            continue;
        };
        if !set.is_match(&rel) {
            continue;
        }

        let result = if entry.file_type().is_dir() {
            walker.skip_current_dir();
            std::fs::remove_dir_all(entry.path())
        } else {
            std::fs::remove_file(entry.path())
        };
        match result {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %entry.path().display(), error = %e, "Failed to remove"),
        }
    }
    Ok(removed)
}

/// Removes a directory tree. Absence is not an error; other failures are
/// logged. Returns whether anything was removed.
pub async fn remove_dir_best_effort(path: &Path) -> bool {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove directory");
            false
        }
    }
}
