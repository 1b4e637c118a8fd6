//! Zip packaging of a staged extension directory.

use crate::core::BuildArtifact;
use crate::errors::ExtpackError;
use crate::fileset::normalize_rel;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zips every file and directory under `source` into `target`.
///
/// Entry names are relative to `source` and use `/`. Entries are written in
/// sorted order with a fixed timestamp so identical trees produce identical
/// archives. `target`'s parent directories are created as needed.
///
/// # Errors
///
/// Returns an error if `source` is not a directory or any read or write fails.
pub fn zip_directory(source: &Path, target: &Path, artifact_type: &str) -> Result<BuildArtifact, ExtpackError> {
    if !source.is_dir() {
        return Err(ExtpackError::Archive(format!(
            "source directory {} does not exist",
            source.display()
        )));
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ExtpackError::io_at(parent, e))?;
    }

    let mut entries: Vec<(String, PathBuf, bool)> = Vec::new();
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry?;
        if let Some(rel) = normalize_rel(source, entry.path()) {
            entries.push((rel, entry.path().to_path_buf(), entry.file_type().is_dir()));
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let file = File::create(target).map_err(|e| ExtpackError::io_at(target, e))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);

    for (name, path, is_dir) in &entries {
        if *is_dir {
            writer.add_directory(format!("{name}/"), options)?;
        } else {
            writer.start_file(name.as_str(), options)?;
            let mut input = File::open(path).map_err(|e| ExtpackError::io_at(path, e))?;
            std::io::copy(&mut input, &mut writer)?;
        }
    }
    writer.finish()?;

    let (bytes, sha256) = digest_file(target)?;
    info!(
        archive = %target.display(),
        entries = entries.len(),
        bytes,
        "Wrote archive"
    );
    Ok(BuildArtifact::new(artifact_type, target, bytes, sha256))
}

/// Runs [`zip_directory`] on the blocking pool.
///
/// # Errors
///
/// See [`zip_directory`].
pub async fn zip_directory_async(
    source: PathBuf,
    target: PathBuf,
    artifact_type: String,
) -> Result<BuildArtifact, ExtpackError> {
    tokio::task::spawn_blocking(move || zip_directory(&source, &target, &artifact_type))
        .await
        .map_err(|e| ExtpackError::Internal(format!("Task join error: {e}")))?
}

/// Returns the file's size and hex SHA-256.
fn digest_file(path: &Path) -> Result<(u64, String), ExtpackError> {
    let mut file = File::open(path).map_err(|e| ExtpackError::io_at(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf).map_err(|e| ExtpackError::io_at(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((total, hex::encode(hasher.finalize())))
}
