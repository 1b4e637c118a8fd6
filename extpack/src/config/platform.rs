//! Target browser platforms and their output locations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A browser the extension is packaged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Google Chrome.
    Chrome,
    /// Mozilla Firefox.
    Firefox,
    /// Microsoft Edge (legacy, Appx packaged).
    Edge,
}

impl Platform {
    /// Every platform, in build order.
    pub const ALL: [Self; 3] = [Self::Chrome, Self::Firefox, Self::Edge];

    /// Returns the platform identifier used in task names and directories.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
            Self::Edge => "edge",
        }
    }

    /// Returns `<dist>/<platform>`.
    #[must_use]
    pub fn dist_dir(self, dist: &Path) -> PathBuf {
        dist.join(self.id())
    }

    /// Returns the directory the unpacked extension is staged into.
    #[must_use]
    pub fn staging_dir(self, dist: &Path) -> PathBuf {
        let leaf = match self {
            Self::Chrome | Self::Firefox => "unpacked",
            Self::Edge => "Extension",
        };
        self.dist_dir(dist).join(leaf)
    }

    /// Returns the archive extension, or `None` when the platform ships unpacked.
    #[must_use]
    pub const fn archive_extension(self) -> Option<&'static str> {
        match self {
            Self::Chrome => Some("zip"),
            Self::Firefox => Some("xpi"),
            Self::Edge => None,
        }
    }

    /// Returns the background entry point script for this platform.
    #[must_use]
    pub const fn entry_point(self) -> &'static str {
        match self {
            Self::Chrome => "background/chromeExtension.js",
            Self::Firefox => "background/firefoxExtension.js",
            Self::Edge => "background/edgeExtension.js",
        }
    }

    /// Returns true if the staged manifest is rewritten for this platform.
    #[must_use]
    pub const fn rewrites_manifest(self) -> bool {
        !matches!(self, Self::Chrome)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_dirs() {
        let dist = Path::new("/out");
        assert_eq!(Platform::Chrome.staging_dir(dist), PathBuf::from("/out/chrome/unpacked"));
        assert_eq!(Platform::Firefox.staging_dir(dist), PathBuf::from("/out/firefox/unpacked"));
        assert_eq!(Platform::Edge.staging_dir(dist), PathBuf::from("/out/edge/Extension"));
    }

    #[test]
    fn test_archive_extensions() {
        assert_eq!(Platform::Chrome.archive_extension(), Some("zip"));
        assert_eq!(Platform::Firefox.archive_extension(), Some("xpi"));
        assert_eq!(Platform::Edge.archive_extension(), None);
    }

    #[test]
    fn test_serde_ids() {
        let json = serde_json::to_string(&Platform::Firefox).unwrap();
        assert_eq!(json, r#""firefox""#);
    }
}
