//! End-to-end runs of the standard graph against a throwaway project.

#[cfg(test)]
mod tests {
    use crate::config::{BuildConfig, CompileCommands, FileSet, ProjectLayout};
    use crate::context::BuildContext;
    use crate::core::TaskStatus;
    use crate::events::{CollectingEventSink, EventKind};
    use crate::manifest::ManifestDocument;
    use crate::pipeline::GraphExecutionResult;
    use crate::plan::standard_graph;
    use pretty_assertions::assert_eq;
    use std::fs::File;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use zip::ZipArchive;

    const BASE_JS: &str = "console.log('base');\nstart();\n";
    const VENDOR_JS: &str = "console.log('vendor');\n";
    const MANIFEST: &str = r#"{
        "name": "Sample Tracker",
        "short_name": "Foo",
        "version": "1.0.0",
        "background": {
            "scripts": ["background/extensionBase.js", "background/chromeExtension.js"]
        }
    }"#;

    fn touch(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn read(path: impl AsRef<Path>) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    struct Project {
        _dir: tempfile::TempDir,
        root: PathBuf,
        dist: PathBuf,
    }

    impl Project {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().to_path_buf();
            let src = root.join("src");
            touch(&src, "manifest.json", MANIFEST);
            touch(&src, "background/extensionBase.js", BASE_JS);
            touch(&src, "background/chromeExtension.js", "debugger;\nchrome();\n");
            touch(&src, "background/firefoxExtension.js", "firefox();\n");
            touch(&src, "background/edgeExtension.js", "edge();\n");
            touch(&src, "lib/vendor.js", VENDOR_JS);
            touch(&src, "in-page-scripts/version.ts", "export default { version: \"1.0.0\" };\n");
            touch(&src, "edge-api-bridges/backgroundScriptsAPIBridge.js", "console.log('bg');\n");
            touch(&src, "edge-api-bridges/contentScriptsAPIBridge.js", "console.log('cs');\n");
            touch(&src, "AppxManifest.xml", "<Identity Name=\"Foo\" Version=\"1.0.0.0\" />\n");

            Self {
                dist: root.join("dist"),
                root,
                _dir: dir,
            }
        }

        fn layout(&self) -> ProjectLayout {
            let mut layout = ProjectLayout::for_root(&self.root)
                .with_compile(CompileCommands::none())
                .with_vendor(Vec::new())
                .with_files(FileSet {
                    common: vec![
                        "manifest.json".into(),
                        "background/extensionBase.js".into(),
                        "lib/**".into(),
                    ],
                    ..FileSet::default()
                });
            // Sources here are hand-written; only source maps count as compiled.
            layout.clean_patterns = vec!["**/*.map".into()];
            layout
        }

        async fn run(&self, config: BuildConfig, target: &str) -> (GraphExecutionResult, Arc<CollectingEventSink>) {
            let sink = Arc::new(CollectingEventSink::new());
            let ctx = BuildContext::new(config, self.layout()).with_event_sink(sink.clone());
            let graph = standard_graph().unwrap().subgraph(target).unwrap();
            let result = graph.execute(Arc::new(ctx)).await.unwrap();
            (result, sink)
        }

        fn staged(&self, platform: &str, rel: &str) -> PathBuf {
            let leaf = if platform == "edge" { "Extension" } else { "unpacked" };
            self.dist.join(platform).join(leaf).join(rel)
        }
    }

    fn zip_entries(path: &Path) -> Vec<String> {
        let mut zip = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_full_build_produces_every_package() {
        let project = Project::new();
        let config = BuildConfig::new(&project.dist).with_version("2.0.0").unwrap();
        let (result, sink) = project.run(config, "build").await;

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.status_of("compile:ts"), Some(TaskStatus::Skip));

        assert!(project.dist.join("chrome/foo-2.0.0.zip").is_file());
        assert!(project.dist.join("firefox/foo-2.0.0.xpi").is_file());
        assert!(!project.dist.join("edge").join("foo-2.0.0.zip").exists());

        let artifacts = result.artifacts();
        let names: Vec<_> = artifacts.iter().filter_map(|a| a.file_name()).collect();
        assert_eq!(names, ["foo-2.0.0.zip", "foo-2.0.0.xpi"]);

        assert!(zip_entries(&project.dist.join("chrome/foo-2.0.0.zip"))
            .contains(&"background/chromeExtension.js".to_string()));

        let finished = sink.events().into_iter().filter(|e| e.kind == EventKind::BuildFinished).count();
        assert_eq!(finished, 1);
    }

    #[tokio::test]
    async fn test_manifests_rewritten_per_platform() {
        let project = Project::new();
        let (result, _) = project.run(BuildConfig::new(&project.dist), "build").await;
        assert!(result.success, "{:?}", result.error);

        let chrome = read(project.staged("chrome", "manifest.json"));
        assert!(chrome.contains("background/chromeExtension.js"));

        let firefox = read(project.staged("firefox", "manifest.json"));
        assert!(!firefox.contains("background/chromeExtension.js"));
        assert!(firefox.contains("background/firefoxExtension.js"));

        let edge = ManifestDocument::read(&project.staged("edge", "manifest.json")).await.unwrap();
        assert_eq!(
            edge.background_scripts(),
            Some(vec!["background/extensionBase.js", "background/edgeExtension.js"])
        );
        assert_eq!(edge.background_persistent(), Some(true));
        assert!(edge.get("-ms-preload").is_some());

        assert!(project.staged("edge", "backgroundScriptsAPIBridge.js").is_file());
        assert!(project.staged("edge", "contentScriptsAPIBridge.js").is_file());
        assert!(project.dist.join("edge/AppxManifest.xml").is_file());
    }

    #[tokio::test]
    async fn test_version_is_stamped_everywhere() {
        let project = Project::new();
        let config = BuildConfig::new(&project.dist).with_version("1.2.3").unwrap();
        let (result, _) = project.run(config, "build").await;
        assert!(result.success, "{:?}", result.error);

        let src = project.root.join("src");
        assert!(read(src.join("manifest.json")).contains("\"version\": \"1.2.3\""));
        assert!(read(src.join("in-page-scripts/version.ts")).contains("version: \"1.2.3\""));
        assert!(read(src.join("AppxManifest.xml")).contains("Version=\"1.2.3.0\""));
        assert!(read(project.dist.join("edge/AppxManifest.xml")).contains("Version=\"1.2.3.0\""));
        assert!(project.dist.join("chrome/foo-1.2.3.zip").is_file());
    }

    #[tokio::test]
    async fn test_debug_statements_stripped_outside_vendor_code() {
        let project = Project::new();
        let (result, _) = project.run(BuildConfig::new(&project.dist), "build").await;
        assert!(result.success, "{:?}", result.error);

        assert_eq!(read(project.staged("chrome", "background/extensionBase.js")), "\nstart();\n");
        assert_eq!(read(project.staged("chrome", "background/chromeExtension.js")), "\nchrome();\n");
        assert_eq!(read(project.staged("firefox", "lib/vendor.js")), VENDOR_JS);
        assert_eq!(
            read(project.staged("edge", "backgroundScriptsAPIBridge.js")),
            "console.log('bg');\n"
        );
    }

    #[tokio::test]
    async fn test_keep_debug_leaves_scripts_identical() {
        let project = Project::new();
        let config = BuildConfig::new(&project.dist).with_keep_debug(true);
        let (result, sink) = project.run(config, "build").await;
        assert!(result.success, "{:?}", result.error);

        for platform in ["chrome", "firefox", "edge"] {
            assert_eq!(read(project.staged(platform, "background/extensionBase.js")), BASE_JS);
            assert_eq!(
                result.status_of(&format!("prepackage:{platform}:strip")),
                Some(TaskStatus::Skip)
            );
        }
        assert_eq!(sink.tasks_with(EventKind::TaskSkipped).iter().filter(|t| t.ends_with(":strip")).count(), 3);
    }

    #[tokio::test]
    async fn test_failed_branch_blocks_only_its_platform() {
        let project = Project::new();
        std::fs::remove_file(project.root.join("src/background/firefoxExtension.js")).unwrap();

        let (result, sink) = project.run(BuildConfig::new(&project.dist), "build").await;

        assert!(!result.success);
        assert_eq!(result.failed_tasks(), ["prepackage:firefox:copy"]);
        assert_eq!(
            result.blocked_tasks(),
            [
                "build",
                "package:firefox",
                "prepackage:firefox",
                "prepackage:firefox:modifyManifest",
                "prepackage:firefox:strip",
            ]
        );
        assert!(result.outputs["prepackage:firefox:copy"]
            .error
            .as_deref()
            .unwrap()
            .contains("File not found with singular glob"));

        assert!(project.dist.join("chrome/foo-1.0.0.zip").is_file());
        assert_eq!(result.status_of("package:edge"), Some(TaskStatus::Ok));
        assert!(sink.tasks_with(EventKind::TaskBlocked).contains(&"build".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_manifest_fails_edge_and_firefox() {
        let project = Project::new();
        touch(&project.root.join("src"), "manifest.json", "{ \"short_name\": ");

        let (result, _) = project.run(BuildConfig::new(&project.dist), "build").await;

        assert_eq!(result.status_of("prepackage:firefox:modifyManifest"), Some(TaskStatus::Fail));
        assert_eq!(result.status_of("prepackage:edge:modifyManifest"), Some(TaskStatus::Fail));
        // Chrome has no rewrite, so the archiver is the first to parse it.
        assert_eq!(result.status_of("package:chrome"), Some(TaskStatus::Fail));
        assert_eq!(
            read(project.staged("edge", "manifest.json")),
            "{ \"short_name\": "
        );
    }

    #[tokio::test]
    async fn test_target_runs_only_its_prerequisites() {
        let project = Project::new();
        let (result, _) = project.run(BuildConfig::new(&project.dist), "package:chrome").await;

        assert!(result.success, "{:?}", result.error);
        assert!(project.dist.join("chrome/foo-1.0.0.zip").is_file());
        assert!(!project.dist.join("firefox").exists());
        assert!(result.status_of("package:firefox").is_none());
    }

    #[tokio::test]
    async fn test_cancelled_build_writes_nothing() {
        let project = Project::new();
        let sink = Arc::new(CollectingEventSink::new());
        let ctx = BuildContext::new(BuildConfig::new(&project.dist), project.layout())
            .with_event_sink(sink.clone());
        ctx.cancellation().cancel("Ctrl-C");

        let result = standard_graph().unwrap().execute(Arc::new(ctx)).await.unwrap();

        assert!(result.cancelled);
        assert_eq!(result.error.as_deref(), Some("Build cancelled: Ctrl-C"));
        assert!(!project.dist.exists());
        assert!(sink.tasks_with(EventKind::TaskStarted).is_empty());
    }
}
