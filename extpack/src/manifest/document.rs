//! Typed access to an extension manifest.

use crate::errors::{ExtpackError, ManifestError};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::path::Path;

/// A parsed `manifest.json`.
///
/// Keys keep the order they were authored in; replacing an existing key keeps
/// its position and new keys are appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDocument {
    root: Map<String, Value>,
}

impl ManifestDocument {
    /// Parses manifest text.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidJson`] for malformed input and
    /// [`ManifestError::NotAnObject`] when the root is not an object.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Wraps an already parsed value.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotAnObject`] when `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self, ManifestError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(ManifestError::NotAnObject),
        }
    }

    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or not a valid manifest.
    pub async fn read(path: &Path) -> Result<Self, ExtpackError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ExtpackError::io_at(path, e))?;
        Ok(Self::parse(&text)?)
    }

    /// Serializes with 4-space indentation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_pretty_string(&self) -> Result<String, ManifestError> {
        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        self.root.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Serializes and writes the manifest to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn write(&self, path: &Path) -> Result<(), ExtpackError> {
        let text = self.to_pretty_string()?;
        tokio::fs::write(path, text)
            .await
            .map_err(|e| ExtpackError::io_at(path, e))
    }

    /// Returns the underlying object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Returns a top-level value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Sets a top-level key, replacing any previous value in place.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.root.insert(key.into(), value);
    }

    /// `short_name`, when it is a string.
    #[must_use]
    pub fn short_name(&self) -> Option<&str> {
        self.root.get("short_name").and_then(Value::as_str)
    }

    /// `version`, when it is a string.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.root.get("version").and_then(Value::as_str)
    }

    /// `background.scripts` entries that are strings, in order.
    #[must_use]
    pub fn background_scripts(&self) -> Option<Vec<&str>> {
        let scripts = self.background()?.get("scripts")?.as_array()?;
        Some(scripts.iter().filter_map(Value::as_str).collect())
    }

    /// `background.persistent`, when it is a boolean.
    #[must_use]
    pub fn background_persistent(&self) -> Option<bool> {
        self.background()?.get("persistent")?.as_bool()
    }

    fn background(&self) -> Option<&Map<String, Value>> {
        self.root.get("background")?.as_object()
    }

    fn background_mut(&mut self) -> Result<&mut Map<String, Value>, ManifestError> {
        self.root
            .get_mut("background")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ManifestError::MissingField("background".to_string()))
    }

    /// Sets `background.persistent`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingField`] when there is no `background`
    /// object.
    pub fn set_background_persistent(&mut self, persistent: bool) -> Result<(), ManifestError> {
        self.background_mut()?
            .insert("persistent".to_string(), Value::Bool(persistent));
        Ok(())
    }

    /// Replaces the first `background.scripts` entry equal to `from` with `to`.
    ///
    /// Returns `Ok(false)` and leaves the list untouched when `from` is not
    /// present.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingField`] when `background.scripts` is not
    /// an array.
    pub fn replace_background_script(&mut self, from: &str, to: &str) -> Result<bool, ManifestError> {
        let scripts = self
            .background_mut()?
            .get_mut("scripts")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| ManifestError::MissingField("background.scripts".to_string()))?;

        match scripts.iter_mut().find(|entry| entry.as_str() == Some(from)) {
            Some(entry) => {
                *entry = Value::String(to.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
    "name": "Sample Tracker",
    "short_name": "Sample",
    "version": "1.0.0",
    "background": {
        "scripts": ["background/extensionBase.js", "background/chromeExtension.js"]
    }
}"#;

    #[test]
    fn test_parse_reads_fields() {
        let doc = ManifestDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.short_name(), Some("Sample"));
        assert_eq!(doc.version(), Some("1.0.0"));
        assert_eq!(
            doc.background_scripts(),
            Some(vec!["background/extensionBase.js", "background/chromeExtension.js"])
        );
        assert_eq!(doc.background_persistent(), None);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(matches!(
            ManifestDocument::parse("{ \"name\": "),
            Err(ManifestError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(ManifestDocument::parse("[1, 2]"), Err(ManifestError::NotAnObject)));
    }

    #[test]
    fn test_pretty_string_uses_four_spaces_and_keeps_order() {
        let doc = ManifestDocument::parse(r#"{"b": 1, "a": {"c": []}}"#).unwrap();
        assert_eq!(
            doc.to_pretty_string().unwrap(),
            "{\n    \"b\": 1,\n    \"a\": {\n        \"c\": []\n    }\n}"
        );
    }

    #[test]
    fn test_set_existing_key_keeps_position() {
        let mut doc = ManifestDocument::parse(r#"{"a": 1, "b": 2}"#).unwrap();
        doc.set("a", serde_json::json!(3));
        doc.set("c", serde_json::json!(4));

        let keys: Vec<&String> = doc.as_map().keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(doc.get("a"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn test_replace_background_script_absent_is_noop() {
        let mut doc = ManifestDocument::parse(SAMPLE).unwrap();
        let before = doc.clone();

        let replaced = doc
            .replace_background_script("background/missing.js", "background/other.js")
            .unwrap();
        assert!(!replaced);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_replace_background_script_without_scripts_is_error() {
        let mut doc = ManifestDocument::parse(r#"{"background": {"page": "bg.html"}}"#).unwrap();
        assert!(matches!(
            doc.replace_background_script("a", "b"),
            Err(ManifestError::MissingField(field)) if field == "background.scripts"
        ));
    }

    #[test]
    fn test_set_persistent_without_background_is_error() {
        let mut doc = ManifestDocument::parse(r#"{"name": "x"}"#).unwrap();
        assert!(doc.set_background_persistent(true).is_err());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let doc = ManifestDocument::parse(SAMPLE).unwrap();

        doc.write(&path).await.unwrap();
        let reread = ManifestDocument::read(&path).await.unwrap();
        assert_eq!(reread, doc);
    }
}
