use anyhow::{Context, Result};
use async_trait::async_trait;
use scribeforge_core::{required_str, Tool};
use serde_json::Value;
use std::fmt;
use std::io::ErrorKind;
use tokio::fs;
use tracing::{debug, warn};

use crate::sandbox::{PathSandbox, SandboxVerdict};

/// Returned to the model when the target does not exist.
pub const FILE_NOT_FOUND: &str = "Error: File not found.";

/// Returned to the model when the target escapes the working directory.
pub const ACCESS_DENIED: &str = "Error: Access denied. The path is outside the working directory.";

/// Outcome of a sandboxed read, rendered to text only at the tool boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Content(String),
    NotFound,
    AccessDenied,
}

impl fmt::Display for ReadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(text) => f.write_str(text),
            Self::NotFound => f.write_str(FILE_NOT_FOUND),
            Self::AccessDenied => f.write_str(ACCESS_DENIED),
        }
    }
}

/// Read-only file access confined to the working directory.
pub struct ReadFileTool {
    sandbox: PathSandbox,
}

impl ReadFileTool {
    pub fn new(sandbox: PathSandbox) -> Self {
        Self { sandbox }
    }

    /// Read `path` as text. Access-control and missing-file conditions come
    /// back as outcomes; only genuine I/O failures are errors.
    pub async fn read(&self, path: &str) -> Result<ReadOutcome> {
        let resolved = match self.sandbox.check(path)? {
            SandboxVerdict::Allowed(resolved) => resolved,
            SandboxVerdict::IsRoot(_) => return Ok(ReadOutcome::NotFound),
            SandboxVerdict::Denied(resolved) => {
                warn!(path, resolved = %resolved.display(), "Read outside working directory denied");
                return Ok(ReadOutcome::AccessDenied);
            }
        };

        let metadata = match fs::metadata(&resolved).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ReadOutcome::NotFound),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to stat {}", resolved.display()))
            }
        };
        if !metadata.is_file() {
            return Ok(ReadOutcome::NotFound);
        }
        if !self.sandbox.confirm_physical(&resolved)? {
            warn!(path, "Read through symlink leaving working directory denied");
            return Ok(ReadOutcome::AccessDenied);
        }

        let content = fs::read_to_string(&resolved)
            .await
            .with_context(|| format!("Failed to read {}", resolved.display()))?;
        debug!(path, bytes = content.len(), "Read file");
        Ok(ReadOutcome::Content(content))
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the full text of a file inside the working directory."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file, relative to the working directory"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let path = required_str(&args, "path")?;
        Ok(self.read(path).await?.to_string())
    }
}
