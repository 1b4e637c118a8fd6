//! Version stamping for the source tree.
//!
//! A version is one to four dot-separated integers. Source files get the
//! version verbatim; the Appx descriptor needs exactly four components, so
//! shorter versions are padded with `.0`.

use crate::errors::{ConfigError, ExtpackError};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static VERSION_ENTRY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(["']?version["']?: ["'])([\d.]+)(["'])"#).expect("version entry regex is valid")
});

static APPX_VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(Version=")([\d.]+)(")"#).expect("appx version regex is valid"));

/// Checks that `version` is 1-4 dot-separated integers.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidVersion`] otherwise.
pub fn validate_version(version: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = version.split('.').collect();
    let well_formed = (1..=4).contains(&parts.len())
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

    if well_formed {
        Ok(())
    } else {
        Err(ConfigError::InvalidVersion(version.to_string()))
    }
}

/// Pads a version to the four components the Appx descriptor requires;
/// `1.2` becomes `1.2.0.0`.
#[must_use]
pub fn pad_appx_version(version: &str) -> String {
    let mut padded = version.to_string();
    for _ in version.split('.').count()..4 {
        padded.push_str(".0");
    }
    padded
}

/// Replaces the first `version: "x"` entry in `text`.
#[must_use]
pub fn replace_version_entry(text: &str, version: &str) -> String {
    VERSION_ENTRY_REGEX
        .replacen(text, 1, |caps: &Captures<'_>| format!("{}{version}{}", &caps[1], &caps[3]))
        .into_owned()
}

/// Replaces the first `Version="x"` attribute in `text`.
#[must_use]
pub fn replace_appx_version(text: &str, version: &str) -> String {
    APPX_VERSION_REGEX
        .replacen(text, 1, |caps: &Captures<'_>| format!("{}{version}{}", &caps[1], &caps[3]))
        .into_owned()
}

/// Rewrites `path` in place with `patch`. Empty files are left alone.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written.
pub async fn patch_file<F>(path: &Path, patch: F) -> Result<bool, ExtpackError>
where
    F: FnOnce(&str) -> String,
{
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ExtpackError::io_at(path, e))?;
    if text.is_empty() {
        debug!(path = %path.display(), "Skipping empty file");
        return Ok(false);
    }

    let patched = patch(&text);
    let changed = patched != text;
    if changed {
        tokio::fs::write(path, patched)
            .await
            .map_err(|e| ExtpackError::io_at(path, e))?;
    }
    debug!(path = %path.display(), changed, "Patched version");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_version() {
        assert!(validate_version("1").is_ok());
        assert!(validate_version("1.2.3").is_ok());
        assert!(validate_version("1.2.3.4").is_ok());
        assert!(validate_version("1.2.3.4.5").is_err());
        assert!(validate_version("1..2").is_err());
        assert!(validate_version("1.2-beta").is_err());
        assert!(validate_version("").is_err());
    }

    #[test]
    fn test_pad_appx_version() {
        assert_eq!(pad_appx_version("1.2.3"), "1.2.3.0");
        assert_eq!(pad_appx_version("1.2.3.4"), "1.2.3.4");
        assert_eq!(pad_appx_version("1.2"), "1.2.0.0");
        assert_eq!(pad_appx_version("7"), "7.0.0.0");
    }

    #[test]
    fn test_replace_version_in_manifest() {
        let manifest = "{\n    \"name\": \"Foo\",\n    \"version\": \"0.9.1\"\n}";
        assert_eq!(
            replace_version_entry(manifest, "1.2.3"),
            "{\n    \"name\": \"Foo\",\n    \"version\": \"1.2.3\"\n}"
        );
    }

    #[test]
    fn test_replace_version_in_typescript() {
        let source = "export const info = { version: '0.1.0' };";
        assert_eq!(
            replace_version_entry(source, "2.0.0"),
            "export const info = { version: '2.0.0' };"
        );
    }

    #[test]
    fn test_replace_only_first_occurrence() {
        let text = r#""version": "1.0", "version": "1.0""#;
        assert_eq!(replace_version_entry(text, "3.0"), r#""version": "3.0", "version": "1.0""#);
    }

    #[test]
    fn test_replace_appx_version() {
        let xml = r#"<Identity Name="Foo" Publisher="CN=x" Version="1.0.0.0" />"#;
        assert_eq!(
            replace_appx_version(xml, "1.2.3.0"),
            r#"<Identity Name="Foo" Publisher="CN=x" Version="1.2.3.0" />"#
        );
    }

    #[tokio::test]
    async fn test_patch_file_skips_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "").unwrap();

        let changed = patch_file(&path, |t| replace_version_entry(t, "1.0")).await.unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_patch_file_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = patch_file(&dir.path().join("nope.ts"), str::to_string).await;
        assert!(matches!(result, Err(ExtpackError::PathIo { .. })));
    }
}
