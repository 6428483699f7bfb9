//! Apply Diff Tool
//!
//! Lets the agent edit a file by submitting a unified diff. The whole patch
//! is applied to an in-memory copy first; the file is only replaced once
//! every hunk has matched, so a stale diff never leaves a half-edited file.
//!
//! The editor takes no locks. Concurrent calls against the same path must be
//! serialized by the caller.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scribeforge_core::{required_str, EditorSettings, ScribeError, Tool};
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::diff::{self, split_lines};
use crate::patch;
use crate::sandbox::{PathSandbox, SandboxVerdict};

/// A file's lines plus the layout details needed to write it back.
///
/// One terminator is kept per file: the most frequent of `\r\n`, `\r` and
/// `\n` (ties go to `\n`). Files that mix styles are normalized to it when
/// rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    pub lines: Vec<String>,
    pub line_ending: &'static str,
    pub trailing_newline: bool,
}

impl TextFile {
    pub fn parse(text: &str) -> Self {
        let line_ending = dominant_line_ending(text);
        if text.is_empty() {
            return Self { lines: Vec::new(), line_ending, trailing_newline: false };
        }
        let mut lines: Vec<String> = split_lines(text).into_iter().map(str::to_string).collect();
        let trailing_newline = text.ends_with('\n') || text.ends_with('\r');
        if trailing_newline {
            lines.pop();
        }
        Self { lines, line_ending, trailing_newline }
    }

    /// Render `lines` using this file's layout. A previously empty file
    /// gets a trailing newline once it has content.
    pub fn render(&self, lines: &[String]) -> String {
        if lines.is_empty() {
            return String::new();
        }
        let mut out = lines.join(self.line_ending);
        if self.trailing_newline || self.lines.is_empty() {
            out.push_str(self.line_ending);
        }
        out
    }
}

fn dominant_line_ending(text: &str) -> &'static str {
    let (mut crlf, mut cr, mut lf) = (0usize, 0usize, 0usize);
    let mut bytes = text.bytes().peekable();
    while let Some(b) = bytes.next() {
        match b {
            b'\r' if bytes.peek() == Some(&b'\n') => {
                bytes.next();
                crlf += 1;
            }
            b'\r' => cr += 1,
            b'\n' => lf += 1,
            _ => {}
        }
    }
    if crlf > lf && crlf >= cr {
        "\r\n"
    } else if cr > lf && cr > crlf {
        "\r"
    } else {
        "\n"
    }
}

/// What an `apply_diff` call did.
#[derive(Debug, Clone, Serialize)]
pub struct PatchSummary {
    pub path: PathBuf,
    pub hunks: usize,
    pub lines_before: usize,
    pub lines_after: usize,
    pub dry_run: bool,
}

/// Read → parse → apply → write pipeline behind the `apply_diff` tool.
#[derive(Clone)]
pub struct PatchEditor {
    sandbox: PathSandbox,
    settings: Arc<dyn EditorSettings>,
}

impl PatchEditor {
    pub fn new(sandbox: PathSandbox, settings: Arc<dyn EditorSettings>) -> Self {
        Self { sandbox, settings }
    }

    pub async fn apply_diff(
        &self,
        path: &str,
        diff_text: &str,
        cancel: &CancellationToken,
    ) -> Result<PatchSummary> {
        let limit = self.settings.max_diff_bytes();
        if diff_text.len() > limit {
            warn!(path, size = diff_text.len(), limit, "Diff exceeds size limit");
            return Err(ScribeError::DiffTooLarge { size: diff_text.len(), limit }.into());
        }

        let target = match self.sandbox.check(path)? {
            SandboxVerdict::Allowed(target) => target,
            SandboxVerdict::IsRoot(_) => return Err(ScribeError::NotFound(path.to_string()).into()),
            SandboxVerdict::Denied(_) => {
                warn!(path, "Edit outside working directory denied");
                return Err(ScribeError::AccessDenied(path.to_string()).into());
            }
        };

        if cancel.is_cancelled() {
            return Err(ScribeError::Cancelled.into());
        }
        let (physical, original) = read_existing(&self.sandbox, path, &target).await?;
        let file = TextFile::parse(&original);

        let hunks = diff::parse(diff_text)?;
        let patched = match patch::apply(&file.lines, &hunks) {
            Ok(lines) => lines,
            Err(e) => {
                warn!(path, error = %e, "Diff does not apply");
                return Err(e.into());
            }
        };

        let summary = PatchSummary {
            path: target.clone(),
            hunks: hunks.len(),
            lines_before: file.lines.len(),
            lines_after: patched.len(),
            dry_run: self.settings.dry_run(),
        };

        if summary.dry_run {
            info!(path, hunks = summary.hunks, "Dry run: diff applies cleanly, file left unchanged");
            return Ok(summary);
        }

        if cancel.is_cancelled() {
            return Err(ScribeError::Cancelled.into());
        }
        write_atomic(&physical, &file.render(&patched)).await?;
        info!(
            path,
            hunks = summary.hunks,
            lines_before = summary.lines_before,
            lines_after = summary.lines_after,
            "Applied diff"
        );
        Ok(summary)
    }
}

/// Read the target, returning its symlink-free location alongside the text.
async fn read_existing(
    sandbox: &PathSandbox,
    path: &str,
    target: &Path,
) -> Result<(PathBuf, String)> {
    match fs::metadata(target).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Err(ScribeError::NotFound(path.to_string()).into()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ScribeError::NotFound(path.to_string()).into())
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to stat {}", target.display())),
    }
    let Some(physical) = sandbox.physical_target(target)? else {
        return Err(ScribeError::AccessDenied(path.to_string()).into());
    };
    let text = fs::read_to_string(&physical)
        .await
        .with_context(|| format!("Failed to read {}", physical.display()))?;
    Ok((physical, text))
}

/// Write to a sibling temp file carrying the target's permissions, then
/// rename over the target. `target` must not be a symlink.
async fn write_atomic(target: &Path, contents: &str) -> Result<()> {
    let file_name = target
        .file_name()
        .with_context(|| format!("{} has no file name", target.display()))?
        .to_string_lossy();
    let tmp = target.with_file_name(format!(".{file_name}.scribeforge.tmp"));
    let permissions = fs::metadata(target)
        .await
        .with_context(|| format!("Failed to stat {}", target.display()))?
        .permissions();

    let staged = async {
        fs::write(&tmp, contents.as_bytes())
            .await
            .with_context(|| format!("Failed to write temp file: {}", tmp.display()))?;
        fs::set_permissions(&tmp, permissions)
            .await
            .with_context(|| format!("Failed to set permissions on {}", tmp.display()))
    };
    if let Err(e) = staged.await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp, target).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("Failed to replace {}", target.display()));
    }
    debug!(path = %target.display(), bytes = contents.len(), "Replaced file");
    Ok(())
}

/// `apply_diff` tool: edits a file in place with a unified diff.
pub struct ApplyDiffTool {
    editor: PatchEditor,
    cancel: CancellationToken,
}

impl ApplyDiffTool {
    pub fn new(editor: PatchEditor) -> Self {
        Self { editor, cancel: CancellationToken::new() }
    }

    /// Tie the tool to a session-wide cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[async_trait]
impl Tool for ApplyDiffTool {
    fn name(&self) -> &str {
        "apply_diff"
    }

    fn description(&self) -> &str {
        "Edit a file inside the working directory by applying a unified diff. \
         Every context and removed line must match the current file exactly; \
         otherwise nothing is written."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to edit, relative to the working directory"
                },
                "diff": {
                    "type": "string",
                    "description": "Unified diff with one or more @@ hunks"
                }
            },
            "required": ["path", "diff"]
        })
    }

    fn mutated_paths(&self, args: &Value) -> Vec<String> {
        args.get("path")
            .and_then(Value::as_str)
            .map(|p| vec![p.to_string()])
            .unwrap_or_default()
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let path = required_str(&args, "path")?;
        let diff_text = required_str(&args, "diff")?;
        let summary = self.editor.apply_diff(path, diff_text, &self.cancel).await?;

        Ok(if summary.dry_run {
            format!(
                "Dry run: {} hunk(s) apply cleanly to {}; file left unchanged.",
                summary.hunks, path
            )
        } else {
            format!("Applied {} hunk(s) to {}.", summary.hunks, path)
        })
    }
}
