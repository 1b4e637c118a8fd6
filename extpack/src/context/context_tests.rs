//! Tests for the context module.

#[cfg(test)]
mod tests {
    use crate::config::{BuildConfig, ProjectLayout};
    use crate::context::{BuildContext, OutputBag, TaskContext};
    use crate::core::{BuildArtifact, TaskOutput, TaskStatus};
    use crate::events::{CollectingEventSink, EventKind};
    use std::sync::Arc;

    fn build_context() -> BuildContext {
        BuildContext::new(BuildConfig::new("/proj/dist"), ProjectLayout::for_root("/proj"))
    }

    #[test]
    fn test_build_context_defaults() {
        let ctx = build_context();
        assert!(!ctx.is_cancelled());
        assert!(ctx.outputs().is_empty());
        assert!(!ctx.config().keep_debug);
        assert_eq!(ctx.layout().source_path(), std::path::PathBuf::from("/proj/src"));
    }

    #[test]
    fn test_shared_cancellation_token() {
        let token = Arc::new(crate::cancellation::CancellationToken::new());
        let ctx = build_context().with_cancellation(Arc::clone(&token));

        token.cancel("interrupted");
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.cancellation().reason().as_deref(), Some("interrupted"));
    }

    #[test]
    fn test_task_context_emits_tagged_events() {
        let sink = Arc::new(CollectingEventSink::new());
        let build = Arc::new(build_context().with_event_sink(sink.clone()));
        let task = TaskContext::new(Arc::clone(&build), "clean:dist");

        task.emit(EventKind::TaskStarted, None);
        build.emit(EventKind::BuildStarted, None);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].task.as_deref(), Some("clean:dist"));
        assert_eq!(events[0].run_id, build.run_id());
        assert_eq!(events[1].task, None);
    }

    #[test]
    fn test_output_bag_rejects_second_write() {
        let bag = OutputBag::new();
        bag.record("version", TaskOutput::ok_empty()).unwrap();

        assert!(bag.record("version", TaskOutput::skip("again")).is_err());
        assert_eq!(bag.get("version").unwrap().status, TaskStatus::Ok);
    }

    #[test]
    fn test_output_bag_collects_artifacts_sorted() {
        let bag = OutputBag::new();
        bag.record(
            "package:firefox",
            TaskOutput::ok_empty().with_artifact(BuildArtifact::new("xpi", "/d/firefox/a.xpi", 1, "x")),
        )
        .unwrap();
        bag.record(
            "package:chrome",
            TaskOutput::ok_empty().with_artifact(BuildArtifact::new("zip", "/d/chrome/a.zip", 1, "y")),
        )
        .unwrap();

        let types: Vec<String> = bag.artifacts().into_iter().map(|a| a.artifact_type).collect();
        assert_eq!(types, vec!["zip", "xpi"]);
    }
}
