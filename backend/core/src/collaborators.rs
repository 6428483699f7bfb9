//! Contracts for the services the tool layer consumes but does not own:
//! version control, runtime settings, and the working directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Default upper bound on the size of a diff accepted by `apply_diff`.
pub const DEFAULT_MAX_DIFF_BYTES: usize = 512 * 1024;

/// Version-control backend used for automatic checkpoints.
#[async_trait]
pub trait VersionControl: Send + Sync {
    fn enabled(&self) -> bool;

    /// Commit the given paths. `Ok(false)` means the backend declined
    /// (e.g. nothing to commit); both that and `Err` count as a failed
    /// checkpoint.
    async fn create_commit(&self, paths: &[String], message: &str) -> Result<bool>;
}

/// Backend that never commits.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledVersionControl;

#[async_trait]
impl VersionControl for DisabledVersionControl {
    fn enabled(&self) -> bool {
        false
    }

    async fn create_commit(&self, _paths: &[String], _message: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Runtime settings read by mutating tools on every call.
pub trait EditorSettings: Send + Sync {
    /// When set, mutations are computed but never written.
    fn dry_run(&self) -> bool;

    fn max_diff_bytes(&self) -> usize {
        DEFAULT_MAX_DIFF_BYTES
    }
}

/// Fixed settings, mostly for embedding and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticSettings {
    pub dry_run: bool,
    pub max_diff_bytes: usize,
}

impl Default for StaticSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_diff_bytes: DEFAULT_MAX_DIFF_BYTES,
        }
    }
}

impl StaticSettings {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}

impl EditorSettings for StaticSettings {
    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn max_diff_bytes(&self) -> usize {
        self.max_diff_bytes
    }
}

/// Source of the sandbox anchor. Queried fresh on every check.
pub trait WorkingDirectory: Send + Sync {
    fn current_dir(&self) -> Result<PathBuf>;
}

/// The process's current directory at the time of the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessWorkingDirectory;

impl WorkingDirectory for ProcessWorkingDirectory {
    fn current_dir(&self) -> Result<PathBuf> {
        std::env::current_dir().context("Failed to determine current working directory")
    }
}

/// A working directory pinned at construction.
#[derive(Debug, Clone)]
pub struct FixedWorkingDirectory(pub PathBuf);

impl FixedWorkingDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(root.into())
    }
}

impl WorkingDirectory for FixedWorkingDirectory {
    fn current_dir(&self) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}
