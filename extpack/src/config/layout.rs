//! Project layout: where sources live and which files belong to each package.
//!
//! Every path in a layout is relative. Source-tree patterns are resolved
//! against [`ProjectLayout::source_path`]; vendor sources against the project
//! root. A layout may be loaded from a JSON file; missing keys fall back to
//! the defaults below.

use super::Platform;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Glob patterns per package, relative to the source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSet {
    /// Files shipped to every platform.
    #[serde(default = "default_common_files")]
    pub common: Vec<String>,
    /// Chrome-only files.
    #[serde(default = "default_chrome_files")]
    pub chrome: Vec<String>,
    /// Firefox-only files.
    #[serde(default = "default_firefox_files")]
    pub firefox: Vec<String>,
    /// Edge-only files.
    #[serde(default = "default_edge_files")]
    pub edge: Vec<String>,
}

fn default_common_files() -> Vec<String> {
    [
        "background/signalRConnection.js",
        "css/*.css",
        "in-page-scripts/integrations/*.js",
        "in-page-scripts/integrationService.js",
        "in-page-scripts/page.js",
        "in-page-scripts/init.js",
        "in-page-scripts/topmostPage.js",
        "in-page-scripts/version.js",
        "in-page-scripts/utils.js",
        "lib/**",
        "images/*.png",
        "popup/popup.html",
        "popup/popupController.js",
        "popup/pagePopupController.js",
        "popup/popupActivator.js",
        "background/extensionBase.js",
        "background/simpleEvent.js",
        "manifest.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_chrome_files() -> Vec<String> {
    vec![Platform::Chrome.entry_point().to_string()]
}

fn default_firefox_files() -> Vec<String> {
    vec![Platform::Firefox.entry_point().to_string()]
}

fn default_edge_files() -> Vec<String> {
    vec![Platform::Edge.entry_point().to_string()]
}

impl Default for FileSet {
    fn default() -> Self {
        Self {
            common: default_common_files(),
            chrome: default_chrome_files(),
            firefox: default_firefox_files(),
            edge: default_edge_files(),
        }
    }
}

impl FileSet {
    /// Returns the platform-specific patterns.
    #[must_use]
    pub fn platform_patterns(&self, platform: Platform) -> &[String] {
        match platform {
            Platform::Chrome => &self.chrome,
            Platform::Firefox => &self.firefox,
            Platform::Edge => &self.edge,
        }
    }

    /// Returns the common patterns followed by the platform's own.
    #[must_use]
    pub fn patterns_for(&self, platform: Platform) -> Vec<String> {
        self.common
            .iter()
            .chain(self.platform_patterns(platform))
            .cloned()
            .collect()
    }
}

/// A third-party file copied into the source tree by the `lib` task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorCopy {
    /// Path relative to the project root.
    pub from: String,
    /// Subdirectory of the vendor directory to place the file in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdir: Option<String>,
    /// New file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

impl VendorCopy {
    /// Copies `from` unchanged into the vendor directory.
    #[must_use]
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            subdir: None,
            rename: None,
        }
    }

    /// Places the file in a subdirectory.
    #[must_use]
    pub fn into_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = Some(subdir.into());
        self
    }

    /// Renames the copied file.
    #[must_use]
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }
}

fn default_vendor() -> Vec<VendorCopy> {
    vec![
        VendorCopy::new("node_modules/jquery/dist/jquery.min.js"),
        VendorCopy::new("node_modules/ms-signalr-client/jquery.signalR-2.2.1.min.js")
            .renamed("jquery.signalr.min.js"),
        VendorCopy::new("node_modules/select2/dist/js/select2.full.min.js").into_subdir("select2"),
        VendorCopy::new("node_modules/select2/dist/css/select2.min.css").into_subdir("select2"),
    ]
}

/// An external program invocation.
///
/// `{src}` in any argument expands to the source directory. When `inputs` is
/// set the command runs once per matching source file, with `{input}` and
/// `{output}` expanded; `{output}` is the input with `output_extension`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to run.
    pub program: String,
    /// Arguments, possibly with placeholders.
    #[serde(default)]
    pub args: Vec<String>,
    /// Source-relative glob selecting per-file inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<String>,
    /// Extension substituted into `{output}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_extension: Option<String>,
}

impl CommandSpec {
    /// Creates a command.
    #[must_use]
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            inputs: None,
            output_extension: None,
        }
    }

    /// Runs the command once per source file matching `pattern`.
    #[must_use]
    pub fn per_file(mut self, pattern: impl Into<String>, output_extension: impl Into<String>) -> Self {
        self.inputs = Some(pattern.into());
        self.output_extension = Some(output_extension.into());
        self
    }
}

/// Compiler invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommands {
    /// TypeScript compiler.
    #[serde(default)]
    pub ts: Option<CommandSpec>,
    /// LESS compiler.
    #[serde(default)]
    pub less: Option<CommandSpec>,
}

impl Default for CompileCommands {
    fn default() -> Self {
        Self {
            ts: Some(CommandSpec::new("npx", ["tsc", "-p", "{src}", "--sourceMap", "false"])),
            less: Some(CommandSpec::new("npx", ["lessc", "{input}", "{output}"]).per_file("css/*.less", "css")),
        }
    }
}

impl CompileCommands {
    /// No compilation; both compile tasks report `skip`.
    #[must_use]
    pub const fn none() -> Self {
        Self { ts: None, less: None }
    }
}

/// Which staged scripts the debug stripper touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripSelection {
    /// Staging-relative include patterns.
    #[serde(default = "default_strip_include")]
    pub include: Vec<String>,
    /// Staging-relative exclude patterns.
    #[serde(default = "default_strip_exclude")]
    pub exclude: Vec<String>,
}

fn default_strip_include() -> Vec<String> {
    vec!["**/*.js".to_string()]
}

fn default_strip_exclude() -> Vec<String> {
    vec!["lib/**/*.js".to_string(), "*APIBridge.js".to_string()]
}

impl Default for StripSelection {
    fn default() -> Self {
        Self {
            include: default_strip_include(),
            exclude: default_strip_exclude(),
        }
    }
}

/// Everything the task graph needs to know about the project on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLayout {
    /// Project root; set when the layout is created or loaded.
    #[serde(skip)]
    pub root: PathBuf,
    /// Source directory relative to the root.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    /// Per-package file patterns.
    #[serde(default)]
    pub files: FileSet,
    /// Edge bridge scripts, copied flattened into the Edge staging root.
    #[serde(default = "default_edge_bridges")]
    pub edge_bridges: Vec<String>,
    /// Appx descriptor, relative to the source directory.
    #[serde(default = "default_appx_manifest")]
    pub appx_manifest: String,
    /// Directory under the source tree receiving vendor files.
    #[serde(default = "default_vendor_dir")]
    pub vendor_dir: String,
    /// Vendor files.
    #[serde(default = "default_vendor")]
    pub vendor: Vec<VendorCopy>,
    /// Compiler invocations.
    #[serde(default)]
    pub compile: CompileCommands,
    /// Compiled artefacts removed by `clean:sources`.
    #[serde(default = "default_clean_patterns")]
    pub clean_patterns: Vec<String>,
    /// Source files whose `version: "x"` entry is patched.
    #[serde(default = "default_version_files")]
    pub version_files: Vec<String>,
    /// Debug stripping selection.
    #[serde(default)]
    pub strip: StripSelection,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_edge_bridges() -> Vec<String> {
    vec![
        "edge-api-bridges/backgroundScriptsAPIBridge.js".to_string(),
        "edge-api-bridges/contentScriptsAPIBridge.js".to_string(),
    ]
}

fn default_appx_manifest() -> String {
    "AppxManifest.xml".to_string()
}

fn default_vendor_dir() -> String {
    "lib".to_string()
}

fn default_clean_patterns() -> Vec<String> {
    [
        "**/*.map",
        "background/*.js",
        "css/*.css",
        "in-page-scripts/**/*.js",
        "lib/*",
        "popup/*.js",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_version_files() -> Vec<String> {
    vec!["manifest.json".to_string(), "in-page-scripts/version.ts".to_string()]
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            source_dir: default_source_dir(),
            files: FileSet::default(),
            edge_bridges: default_edge_bridges(),
            appx_manifest: default_appx_manifest(),
            vendor_dir: default_vendor_dir(),
            vendor: default_vendor(),
            compile: CompileCommands::default(),
            clean_patterns: default_clean_patterns(),
            version_files: default_version_files(),
            strip: StripSelection::default(),
        }
    }
}

impl ProjectLayout {
    /// Creates the default layout for a project at `root`.
    #[must_use]
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Parses a layout from JSON; the root is the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLayout`] if the file cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidLayout {
            path: path.display().to_string(),
            message,
        };
        let text = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let mut layout: Self = serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;
        layout.root = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(layout)
    }

    /// Sets the compiler invocations.
    #[must_use]
    pub fn with_compile(mut self, compile: CompileCommands) -> Self {
        self.compile = compile;
        self
    }

    /// Sets the vendor files.
    #[must_use]
    pub fn with_vendor(mut self, vendor: Vec<VendorCopy>) -> Self {
        self.vendor = vendor;
        self
    }

    /// Sets the file sets.
    #[must_use]
    pub fn with_files(mut self, files: FileSet) -> Self {
        self.files = files;
        self
    }

    /// Absolute source directory.
    #[must_use]
    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.source_dir)
    }

    /// Absolute vendor directory.
    #[must_use]
    pub fn vendor_path(&self) -> PathBuf {
        self.source_path().join(&self.vendor_dir)
    }

    /// Absolute Appx descriptor path.
    #[must_use]
    pub fn appx_manifest_path(&self) -> PathBuf {
        self.source_path().join(&self.appx_manifest)
    }
}
