/// Action dispatcher.
///
/// The dispatcher is the single entry point for agent tool calls:
/// 1. Look the tool up by name
/// 2. Build an `ActionInvocation`, asking the tool which paths it mutates
/// 3. Run the registered filters around the tool's `execute`
///
/// Calls are not serialized here; the agent loop drives one call at a time.
use scribeforge_config::ScribeConfig;
use scribeforge_core::{
    DisabledVersionControl, EditorSettings, ScribeError, ToolDefinition, ToolRegistry,
    VersionControl,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::builtin::{CheckpointFilter, LoggingFilter};
use crate::registry::{ActionFilter, FilterRegistry, Next};
use crate::types::{ActionInvocation, ActionOutcome};

#[derive(Clone, Default)]
pub struct ActionDispatcher {
    pub tools: ToolRegistry,
    pub filters: FilterRegistry,
}

impl ActionDispatcher {
    pub fn new(tools: ToolRegistry, filters: FilterRegistry) -> Self {
        Self { tools, filters }
    }

    /// Dispatcher with the audit log outermost and checkpointing inside it.
    pub fn with_checkpoints(
        tools: ToolRegistry,
        vcs: Arc<dyn VersionControl>,
        settings: Arc<dyn EditorSettings>,
        commit_prefix: Option<String>,
    ) -> Self {
        let mut checkpoint = CheckpointFilter::new(vcs, settings);
        if let Some(prefix) = commit_prefix {
            checkpoint = checkpoint.with_message_prefix(prefix);
        }

        let mut filters = FilterRegistry::new();
        filters.register(Arc::new(LoggingFilter));
        filters.register(Arc::new(checkpoint));
        Self::new(tools, filters)
    }

    /// Dispatcher wired from the `editor` and `versionControl` config
    /// sections. A disabled section replaces `vcs` with a no-op backend.
    pub fn from_config(
        tools: ToolRegistry,
        vcs: Arc<dyn VersionControl>,
        config: &ScribeConfig,
    ) -> Self {
        let vcs: Arc<dyn VersionControl> = if config.version_control_enabled() {
            vcs
        } else {
            Arc::new(DisabledVersionControl)
        };
        Self::with_checkpoints(tools, vcs, Arc::new(config.editor()), config.commit_prefix())
    }

    pub fn add_filter(&mut self, filter: Arc<dyn ActionFilter>) {
        self.filters.register(filter);
    }

    /// Tool definitions to advertise to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.definitions()
    }

    pub async fn dispatch(&self, name: &str, arguments: Value) -> ActionOutcome {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ScribeError::UnknownTool(name.to_string()))?;

        let mutated_paths = tool.mutated_paths(&arguments);
        let invocation = ActionInvocation::new(name, arguments, mutated_paths);
        debug!(
            "[Dispatcher] {} id={} mutating={}",
            invocation.name,
            invocation.id,
            invocation.is_mutating()
        );

        Next::new(self.filters.filters(), tool.as_ref())
            .run(&invocation)
            .await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use scribeforge_core::{FixedWorkingDirectory, StaticSettings, Tool};
    use scribeforge_tools::{
        ApplyDiffTool, PatchEditor, PatchError, PathComparison, PathSandbox, ReadFileTool,
        ACCESS_DENIED,
    };
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    use crate::testing::RecordingVcs;

    fn sandbox(root: &Path) -> PathSandbox {
        PathSandbox::new(Arc::new(FixedWorkingDirectory::new(root)))
            .with_comparison(PathComparison::CaseSensitive)
    }

    fn dispatcher(root: &Path, vcs: Arc<RecordingVcs>, settings: StaticSettings) -> ActionDispatcher {
        let settings: Arc<dyn EditorSettings> = Arc::new(settings);
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(ReadFileTool::new(sandbox(root))));
        tools.register(Arc::new(ApplyDiffTool::new(PatchEditor::new(
            sandbox(root),
            settings.clone(),
        ))));
        ActionDispatcher::with_checkpoints(tools, vcs, settings, None)
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ch1.md"), "a\nb\nc\n").unwrap();
        dir
    }

    const INSERT_X: &str = "@@ -1,3 +1,4 @@\n a\n+x\n b\n c";

    #[tokio::test]
    async fn successful_edit_commits_once() {
        let dir = project();
        let vcs = Arc::new(RecordingVcs::committing());
        let dispatcher = dispatcher(dir.path(), vcs.clone(), StaticSettings::default());

        let out = dispatcher
            .dispatch("apply_diff", serde_json::json!({ "path": "ch1.md", "diff": INSERT_X }))
            .await
            .unwrap();
        assert_eq!(out, "Applied 1 hunk(s) to ch1.md.");

        let commits = vcs.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].0, vec!["ch1.md".to_string()]);
        assert_eq!(commits[0].1, "apply_diff: update ch1.md");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("ch1.md")).unwrap(),
            "a\nx\nb\nc\n"
        );
    }

    #[tokio::test]
    async fn failed_edit_does_not_commit() {
        let dir = project();
        let vcs = Arc::new(RecordingVcs::committing());
        let dispatcher = dispatcher(dir.path(), vcs.clone(), StaticSettings::default());

        let err = dispatcher
            .dispatch(
                "apply_diff",
                serde_json::json!({ "path": "ch1.md", "diff": "@@ -1,3 +1,2 @@\n a\n-z\n c" }),
            )
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<PatchError>().is_some());
        assert!(vcs.commits().is_empty());
        assert_eq!(std::fs::read_to_string(dir.path().join("ch1.md")).unwrap(), "a\nb\nc\n");
    }

    #[tokio::test]
    async fn reads_never_commit() {
        let dir = project();
        let vcs = Arc::new(RecordingVcs::committing());
        let dispatcher = dispatcher(dir.path(), vcs.clone(), StaticSettings::default());

        let out = dispatcher
            .dispatch("read_file", serde_json::json!({ "path": "ch1.md" }))
            .await
            .unwrap();
        assert_eq!(out, "a\nb\nc\n");
        let denied = dispatcher
            .dispatch("read_file", serde_json::json!({ "path": "../elsewhere.md" }))
            .await
            .unwrap();
        assert_eq!(denied, ACCESS_DENIED);
        assert!(vcs.commits().is_empty());
    }

    #[tokio::test]
    async fn commit_failure_does_not_fail_the_edit() {
        let dir = project();
        let vcs = Arc::new(RecordingVcs::failing());
        let dispatcher = dispatcher(dir.path(), vcs.clone(), StaticSettings::default());

        let out = dispatcher
            .dispatch("apply_diff", serde_json::json!({ "path": "ch1.md", "diff": INSERT_X }))
            .await;
        assert!(out.is_ok());
        assert_eq!(vcs.commits().len(), 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("ch1.md")).unwrap(),
            "a\nx\nb\nc\n"
        );
    }

    #[tokio::test]
    async fn dry_run_writes_nothing_and_skips_checkpoint() {
        let dir = project();
        let vcs = Arc::new(RecordingVcs::committing());
        let dispatcher = dispatcher(dir.path(), vcs.clone(), StaticSettings::dry_run());

        let out = dispatcher
            .dispatch("apply_diff", serde_json::json!({ "path": "ch1.md", "diff": INSERT_X }))
            .await
            .unwrap();
        assert!(out.starts_with("Dry run"));
        assert_eq!(std::fs::read(dir.path().join("ch1.md")).unwrap(), b"a\nb\nc\n");
        assert!(vcs.commits().is_empty());
    }

    #[tokio::test]
    async fn disabled_version_control_skips_checkpoint() {
        let dir = project();
        let vcs = Arc::new(RecordingVcs::disabled());
        let dispatcher = dispatcher(dir.path(), vcs.clone(), StaticSettings::default());
        dispatcher
            .dispatch("apply_diff", serde_json::json!({ "path": "ch1.md", "diff": INSERT_X }))
            .await
            .unwrap();
        assert!(vcs.commits().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let dir = project();
        let dispatcher = dispatcher(dir.path(), Arc::new(RecordingVcs::committing()), StaticSettings::default());
        let err = dispatcher
            .dispatch("delete_everything", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScribeError>(),
            Some(ScribeError::UnknownTool(name)) if name == "delete_everything"
        ));
    }

    /// Mutating tool that knows nothing about version control.
    struct AppendLineTool {
        root: std::path::PathBuf,
    }

    #[async_trait]
    impl Tool for AppendLineTool {
        fn name(&self) -> &str {
            "append_line"
        }

        fn description(&self) -> &str {
            "Append a line to a file."
        }

        fn parameters(&self) -> Value {
            serde_json::json!({ "type": "object" })
        }

        fn mutated_paths(&self, args: &Value) -> Vec<String> {
            args["path"].as_str().map(|p| vec![p.to_string()]).unwrap_or_default()
        }

        async fn execute(&self, args: Value) -> Result<String> {
            let path = self.root.join(args["path"].as_str().unwrap_or_default());
            let mut text = std::fs::read_to_string(&path)?;
            text.push_str(args["line"].as_str().unwrap_or_default());
            text.push('\n');
            std::fs::write(&path, text)?;
            Ok("ok".into())
        }
    }

    #[tokio::test]
    async fn new_mutating_tools_are_checkpointed_by_registration() {
        let dir = project();
        let vcs = Arc::new(RecordingVcs::committing());
        let mut dispatcher = dispatcher(dir.path(), vcs.clone(), StaticSettings::default());
        dispatcher.tools.register(Arc::new(AppendLineTool { root: dir.path().to_path_buf() }));

        dispatcher
            .dispatch("append_line", serde_json::json!({ "path": "ch1.md", "line": "d" }))
            .await
            .unwrap();
        let commits = vcs.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].1, "append_line: update ch1.md");
    }

    struct TraceFilter {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ActionFilter for TraceFilter {
        fn name(&self) -> &str {
            self.label
        }

        async fn invoke(&self, invocation: &ActionInvocation, next: Next<'_>) -> ActionOutcome {
            self.log.lock().unwrap().push(format!("{}:before", self.label));
            let outcome = next.run(invocation).await;
            self.log.lock().unwrap().push(format!("{}:after", self.label));
            outcome
        }
    }

    #[tokio::test]
    async fn filters_run_in_registration_order() {
        let dir = project();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(ReadFileTool::new(sandbox(dir.path()))));
        let mut dispatcher = ActionDispatcher::new(tools, FilterRegistry::new());
        dispatcher.add_filter(Arc::new(TraceFilter { label: "outer", log: log.clone() }));
        dispatcher.add_filter(Arc::new(TraceFilter { label: "inner", log: log.clone() }));

        dispatcher
            .dispatch("read_file", serde_json::json!({ "path": "ch1.md" }))
            .await
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["outer:before", "inner:before", "inner:after", "outer:after"]
        );
        assert_eq!(dispatcher.filters.names(), vec!["outer", "inner"]);
    }

    #[tokio::test]
    async fn config_supplies_prefix_and_dry_run() {
        let dir = project();
        let mut tools = ToolRegistry::new();
        let config: ScribeConfig = serde_yaml::from_str(
            "editor:\n  dryRun: false\nversionControl:\n  commitPrefix: scribe\n",
        )
        .unwrap();
        tools.register(Arc::new(ApplyDiffTool::new(PatchEditor::new(
            sandbox(dir.path()),
            Arc::new(config.editor()),
        ))));
        let vcs = Arc::new(RecordingVcs::committing());
        let dispatcher = ActionDispatcher::from_config(tools, vcs.clone(), &config);

        dispatcher
            .dispatch("apply_diff", serde_json::json!({ "path": "ch1.md", "diff": INSERT_X }))
            .await
            .unwrap();
        let commits = vcs.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].1, "scribe: apply_diff: update ch1.md");
    }

    #[tokio::test]
    async fn config_can_disable_checkpoints() {
        let dir = project();
        let config: ScribeConfig =
            serde_yaml::from_str("versionControl:\n  enabled: false\n").unwrap();
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(ApplyDiffTool::new(PatchEditor::new(
            sandbox(dir.path()),
            Arc::new(config.editor()),
        ))));
        let vcs = Arc::new(RecordingVcs::committing());
        let dispatcher = ActionDispatcher::from_config(tools, vcs.clone(), &config);

        dispatcher
            .dispatch("apply_diff", serde_json::json!({ "path": "ch1.md", "diff": INSERT_X }))
            .await
            .unwrap();
        assert!(vcs.commits().is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("ch1.md")).unwrap(),
            "a\nx\nb\nc\n"
        );
    }

    #[test]
    fn definitions_come_from_registered_tools() {
        let dir = project();
        let dispatcher = dispatcher(dir.path(), Arc::new(RecordingVcs::committing()), StaticSettings::default());
        let names: Vec<_> = dispatcher.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["apply_diff", "read_file"]);
        assert_eq!(dispatcher.filters.names(), vec!["logging_filter", "checkpoint_filter"]);
    }
}
