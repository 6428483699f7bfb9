/// Built-in filter implementations.
///
/// `LoggingFilter` records every invocation on the audit stream;
/// `CheckpointFilter` commits the paths touched by every successful mutating
/// action. Both apply to all tools; nothing is wired per tool.
use async_trait::async_trait;
use scribeforge_core::{EditorSettings, VersionControl};
use scribeforge_logging::{ActionEvent, EventLogger};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::registry::{ActionFilter, Next};
use crate::types::{ActionInvocation, ActionOutcome, CheckpointStatus};

// ---------------------------------------------------------------------------
// Logging filter: records every invocation and its outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LoggingFilter;

#[async_trait]
impl ActionFilter for LoggingFilter {
    fn name(&self) -> &str {
        "logging_filter"
    }

    async fn invoke(&self, invocation: &ActionInvocation, next: Next<'_>) -> ActionOutcome {
        let id = invocation.id.to_string();
        EventLogger::log_event(
            &id,
            ActionEvent::ToolInvoked {
                tool_name: invocation.name.clone(),
                arguments_json: invocation.arguments.to_string(),
            },
        );

        let outcome = next.run(invocation).await;

        let event = match &outcome {
            Ok(_) => ActionEvent::ToolSucceeded {
                tool_name: invocation.name.clone(),
                elapsed_ms: invocation.elapsed_ms(),
            },
            Err(e) => ActionEvent::ToolFailed {
                tool_name: invocation.name.clone(),
                error_msg: format!("{e:#}"),
                elapsed_ms: invocation.elapsed_ms(),
            },
        };
        EventLogger::log_event(&id, event);
        outcome
    }
}

// ---------------------------------------------------------------------------
// Checkpoint filter: version-control commit after successful mutations
// ---------------------------------------------------------------------------

pub struct CheckpointFilter {
    vcs: Arc<dyn VersionControl>,
    settings: Arc<dyn EditorSettings>,
    message_prefix: Option<String>,
}

impl CheckpointFilter {
    pub fn new(vcs: Arc<dyn VersionControl>, settings: Arc<dyn EditorSettings>) -> Self {
        Self {
            vcs,
            settings,
            message_prefix: None,
        }
    }

    pub fn with_message_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.message_prefix = (!prefix.trim().is_empty()).then_some(prefix);
        self
    }

    pub fn commit_message(&self, invocation: &ActionInvocation) -> String {
        let body = format!(
            "{}: update {}",
            invocation.name,
            invocation.mutated_paths.join(", ")
        );
        match &self.message_prefix {
            Some(prefix) => format!("{prefix}: {body}"),
            None => body,
        }
    }

    /// Checkpoint a successful invocation. Never fails; problems are
    /// reported through the returned status.
    pub async fn checkpoint(&self, invocation: &ActionInvocation) -> CheckpointStatus {
        if !invocation.is_mutating() {
            return CheckpointStatus::Skipped("read-only action".into());
        }
        if !self.vcs.enabled() {
            return CheckpointStatus::Skipped("version control disabled".into());
        }
        if self.settings.dry_run() {
            return CheckpointStatus::Skipped("dry run".into());
        }

        let message = self.commit_message(invocation);
        match self
            .vcs
            .create_commit(&invocation.mutated_paths, &message)
            .await
        {
            Ok(true) => CheckpointStatus::Checkpointed,
            Ok(false) => CheckpointStatus::Failed("version control declined the commit".into()),
            Err(e) => CheckpointStatus::Failed(format!("{e:#}")),
        }
    }
}

#[async_trait]
impl ActionFilter for CheckpointFilter {
    fn name(&self) -> &str {
        "checkpoint_filter"
    }

    async fn invoke(&self, invocation: &ActionInvocation, next: Next<'_>) -> ActionOutcome {
        let outcome = next.run(invocation).await;
        if outcome.is_err() {
            return outcome;
        }

        let status = self.checkpoint(invocation).await;
        match &status {
            CheckpointStatus::Checkpointed => {
                info!(tool = %invocation.name, paths = ?invocation.mutated_paths, "Checkpoint committed")
            }
            CheckpointStatus::Skipped(reason) => {
                debug!(tool = %invocation.name, reason = %reason, "Checkpoint skipped")
            }
            CheckpointStatus::Failed(reason) => {
                warn!(tool = %invocation.name, paths = ?invocation.mutated_paths, reason = %reason, "Checkpoint failed")
            }
        }
        if invocation.is_mutating() {
            EventLogger::log_event(
                &invocation.id.to_string(),
                ActionEvent::Checkpoint {
                    tool_name: invocation.name.clone(),
                    paths: invocation.mutated_paths.clone(),
                    status: status.to_string(),
                },
            );
        }
        outcome
    }
}
