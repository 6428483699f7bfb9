//! Path Sandbox
//!
//! Confines agent-supplied paths to the working root. Resolution is purely
//! lexical: `.` and `..` are folded without consulting the filesystem, so a
//! path through a not-yet-existing directory cannot be used to escape.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;
use tracing::debug;

use scribeforge_core::WorkingDirectory;

/// How path prefixes are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathComparison {
    CaseSensitive,
    CaseInsensitive,
}

impl PathComparison {
    /// The default for the host filesystem.
    pub fn platform_default() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            Self::CaseInsensitive
        } else {
            Self::CaseSensitive
        }
    }
}

/// Result of checking a candidate path against the working root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxVerdict {
    /// Strictly inside the root.
    Allowed(PathBuf),
    /// Resolves to the root itself.
    IsRoot(PathBuf),
    Denied(PathBuf),
}

/// Resolve `candidate` against `root` if relative and fold `.`/`..`.
///
/// `..` never climbs above the filesystem root.
pub fn resolve(candidate: &str, root: &Path) -> PathBuf {
    let raw = Path::new(candidate);
    if raw.is_absolute() {
        normalize_lexical(raw)
    } else {
        normalize_lexical(&root.join(raw))
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never climb above the root or drive prefix.
                if out.parent().is_some() {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True iff `absolute` lies strictly below `root`.
pub fn is_within_root(absolute: &Path, root: &Path, comparison: PathComparison) -> bool {
    let root_text = root.to_string_lossy();
    let root = trim_trailing_separators(&root_text);
    let candidate = absolute.to_string_lossy();
    let prefix = format!("{root}{MAIN_SEPARATOR}");

    match comparison {
        PathComparison::CaseSensitive => candidate.starts_with(&prefix),
        PathComparison::CaseInsensitive => candidate
            .to_lowercase()
            .starts_with(&prefix.to_lowercase()),
    }
}

fn same_path(a: &Path, b: &Path, comparison: PathComparison) -> bool {
    let a = trim_trailing_separators(&a.to_string_lossy()).to_string();
    let b = trim_trailing_separators(&b.to_string_lossy()).to_string();
    match comparison {
        PathComparison::CaseSensitive => a == b,
        PathComparison::CaseInsensitive => a.to_lowercase() == b.to_lowercase(),
    }
}

// "/" trims to "", which still yields the right "/" prefix.
fn trim_trailing_separators(path: &str) -> &str {
    path.trim_end_matches(['/', MAIN_SEPARATOR])
}

/// Sandbox bound to a working-directory provider.
#[derive(Clone)]
pub struct PathSandbox {
    working_dir: Arc<dyn WorkingDirectory>,
    comparison: PathComparison,
}

impl PathSandbox {
    pub fn new(working_dir: Arc<dyn WorkingDirectory>) -> Self {
        Self {
            working_dir,
            comparison: PathComparison::platform_default(),
        }
    }

    pub fn with_comparison(mut self, comparison: PathComparison) -> Self {
        self.comparison = comparison;
        self
    }

    /// Current working root, read fresh.
    pub fn root(&self) -> Result<PathBuf> {
        Ok(normalize_lexical(&self.working_dir.current_dir()?))
    }

    pub fn check(&self, candidate: &str) -> Result<SandboxVerdict> {
        let root = self.root()?;
        let resolved = resolve(candidate, &root);

        let verdict = if same_path(&resolved, &root, self.comparison) {
            SandboxVerdict::IsRoot(resolved)
        } else if is_within_root(&resolved, &root, self.comparison) {
            SandboxVerdict::Allowed(resolved)
        } else {
            SandboxVerdict::Denied(resolved)
        };
        debug!(candidate, root = %root.display(), verdict = ?verdict, "Sandbox check");
        Ok(verdict)
    }

    /// Re-check an existing, lexically allowed path after following
    /// symlinks, so a link inside the root cannot point outside it.
    pub fn confirm_physical(&self, resolved: &Path) -> Result<bool> {
        Ok(self.physical_target(resolved)?.is_some())
    }

    /// The symlink-free location of an existing path, or `None` when that
    /// location lies outside the root.
    pub fn physical_target(&self, resolved: &Path) -> Result<Option<PathBuf>> {
        let root = self
            .root()?
            .canonicalize()
            .context("Failed to resolve working directory")?;
        let target = resolved
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", resolved.display()))?;
        Ok(is_within_root(&target, &root, self.comparison).then_some(target))
    }
}
