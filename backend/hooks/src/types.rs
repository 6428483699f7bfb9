/// Data carried through one pass of the action filter chain.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// A single agent tool call, alive only for the duration of one dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionInvocation {
    pub id: Uuid,
    pub name: String,
    pub arguments: serde_json::Value,
    /// Paths the tool declared it will modify. Empty for read-only tools.
    pub mutated_paths: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl ActionInvocation {
    pub fn new(
        name: impl Into<String>,
        arguments: serde_json::Value,
        mutated_paths: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            arguments,
            mutated_paths,
            started_at: Utc::now(),
        }
    }

    pub fn is_mutating(&self) -> bool {
        !self.mutated_paths.is_empty()
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}

/// Result of running an invocation: tool text on success.
pub type ActionOutcome = anyhow::Result<String>;

// ---------------------------------------------------------------------------
// Checkpoint status
// ---------------------------------------------------------------------------

/// What the checkpoint stage did after a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum CheckpointStatus {
    Checkpointed,
    Skipped(String),
    /// Logged only; never surfaced to the caller.
    Failed(String),
}

impl fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkpointed => f.write_str("checkpointed"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
