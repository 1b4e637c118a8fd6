//! Extension manifest handling.
//!
//! - [`ManifestDocument`]: order-preserving typed wrapper over `manifest.json`
//! - [`transform`]: pure per-platform rewrites
//! - [`archive_file_name`]: `<short_name>-<version>.<ext>` naming

mod document;
pub mod transform;

pub use document::ManifestDocument;
pub use transform::{transform_for, ManifestTransform};

use crate::config::Platform;
use crate::errors::{ExtpackError, ManifestError};
use std::path::Path;
use tracing::info;

/// Builds the archive name for `platform` from the manifest's `short_name`
/// (lowercased) and `version`.
///
/// # Errors
///
/// Returns [`ManifestError::MissingField`] when either field is absent or
/// empty, or when `platform` produces no archive.
pub fn archive_file_name(doc: &ManifestDocument, platform: Platform) -> Result<String, ManifestError> {
    let short_name = doc
        .short_name()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ManifestError::MissingField("short_name".to_string()))?;
    let version = doc
        .version()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ManifestError::MissingField("version".to_string()))?;
    let extension = platform
        .archive_extension()
        .ok_or_else(|| ManifestError::MissingField(format!("archive extension for {platform}")))?;

    Ok(format!("{}-{version}.{extension}", short_name.to_lowercase()))
}

/// Reads the manifest at `path`, applies the `platform` rewrite and writes it
/// back.
///
/// Nothing is written unless every step succeeds.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, rewritten or written.
pub async fn rewrite_file(path: &Path, platform: Platform) -> Result<ManifestDocument, ExtpackError> {
    let doc = ManifestDocument::read(path).await?;
    let doc = transform_for(platform)(doc)?;
    doc.write(path).await?;
    info!(platform = %platform, path = %path.display(), "Rewrote manifest");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_archive_file_name() {
        let doc = ManifestDocument::parse(r#"{"short_name": "Foo", "version": "2.0.0"}"#).unwrap();
        assert_eq!(archive_file_name(&doc, Platform::Chrome).unwrap(), "foo-2.0.0.zip");
        assert_eq!(archive_file_name(&doc, Platform::Firefox).unwrap(), "foo-2.0.0.xpi");
        assert!(archive_file_name(&doc, Platform::Edge).is_err());
    }

    #[test]
    fn test_archive_file_name_requires_fields() {
        let doc = ManifestDocument::parse(r#"{"short_name": "", "version": "2.0.0"}"#).unwrap();
        assert!(matches!(
            archive_file_name(&doc, Platform::Chrome),
            Err(ManifestError::MissingField(field)) if field == "short_name"
        ));

        let doc = ManifestDocument::parse(r#"{"short_name": "Foo"}"#).unwrap();
        assert!(matches!(
            archive_file_name(&doc, Platform::Chrome),
            Err(ManifestError::MissingField(field)) if field == "version"
        ));
    }

    #[tokio::test]
    async fn test_rewrite_file_leaves_file_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let original = r#"{"short_name": "x"}"#;
        std::fs::write(&path, original).unwrap();

        assert!(rewrite_file(&path, Platform::Edge).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[tokio::test]
    async fn test_rewrite_file_firefox() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"{"background": {"scripts": ["background/chromeExtension.js"]}}"#,
        )
        .unwrap();

        rewrite_file(&path, Platform::Firefox).await.unwrap();
        let reread = ManifestDocument::read(&path).await.unwrap();
        assert_eq!(
            reread.background_scripts(),
            Some(vec!["background/firefoxExtension.js"])
        );
    }
}
