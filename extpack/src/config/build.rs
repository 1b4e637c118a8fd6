//! The immutable build configuration.

use crate::errors::ConfigError;
use crate::versioning::validate_version;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Settings every task reads.
///
/// Built once from [`ConfigOverrides`] and shared behind an `Arc`; nothing
/// mutates it after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Root of all platform outputs.
    pub dist_dir: PathBuf,
    /// Version to stamp into the source tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Keep `console.*` and `debugger` statements in staged scripts.
    pub keep_debug: bool,
}

impl BuildConfig {
    /// Creates a configuration writing to `dist_dir`.
    #[must_use]
    pub fn new(dist_dir: impl Into<PathBuf>) -> Self {
        Self {
            dist_dir: dist_dir.into(),
            version: None,
            keep_debug: false,
        }
    }

    /// Sets the version after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidVersion`] for anything other than 1-4
    /// dot-separated integers.
    pub fn with_version(mut self, version: impl Into<String>) -> Result<Self, ConfigError> {
        let version = version.into();
        validate_version(&version)?;
        self.version = Some(version);
        Ok(self)
    }

    /// Sets the debug-retention flag.
    #[must_use]
    pub const fn with_keep_debug(mut self, keep_debug: bool) -> Self {
        self.keep_debug = keep_debug;
        self
    }
}

/// Command-line values layered over the defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `--distDir`.
    pub dist_dir: Option<PathBuf>,
    /// `--version`.
    pub version: Option<String>,
    /// `--keepDebug`.
    pub keep_debug: Option<bool>,
}

impl ConfigOverrides {
    /// Merges the overrides over the defaults for a project at `root`.
    ///
    /// The default dist directory is `<root>/dist`; a relative `--distDir` is
    /// resolved against `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the version override is malformed.
    pub fn resolve(self, root: &Path) -> Result<BuildConfig, ConfigError> {
        let dist_dir = match self.dist_dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => root.join(dir),
            None => root.join("dist"),
        };

        let mut config = BuildConfig::new(dist_dir).with_keep_debug(self.keep_debug.unwrap_or(false));
        if let Some(version) = self.version {
            config = config.with_version(version)?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConfigOverrides::default().resolve(Path::new("/proj")).unwrap();
        assert_eq!(config.dist_dir, PathBuf::from("/proj/dist"));
        assert_eq!(config.version, None);
        assert!(!config.keep_debug);
    }

    #[test]
    fn test_overrides_win() {
        let overrides = ConfigOverrides {
            dist_dir: Some(PathBuf::from("out")),
            version: Some("1.2.3".to_string()),
            keep_debug: Some(true),
        };
        let config = overrides.resolve(Path::new("/proj")).unwrap();

        assert_eq!(config.dist_dir, PathBuf::from("/proj/out"));
        assert_eq!(config.version.as_deref(), Some("1.2.3"));
        assert!(config.keep_debug);
    }

    #[test]
    fn test_absolute_dist_dir_kept() {
        let overrides = ConfigOverrides {
            dist_dir: Some(PathBuf::from("/tmp/out")),
            ..Default::default()
        };
        let config = overrides.resolve(Path::new("/proj")).unwrap();
        assert_eq!(config.dist_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_invalid_version_rejected() {
        let overrides = ConfigOverrides {
            version: Some("v1.2".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            overrides.resolve(Path::new("/proj")),
            Err(ConfigError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_serializes_like_cli_flags() {
        let config = BuildConfig::new("/d").with_keep_debug(true);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["distDir"], "/d");
        assert_eq!(json["keepDebug"], true);
        assert!(json.get("version").is_none());
    }
}
