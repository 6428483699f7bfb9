//! Test doubles shared by the filter and dispatcher tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use scribeforge_core::VersionControl;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy)]
enum Mode {
    Commit,
    Decline,
    Fail,
}

/// Version-control fake that records every commit request.
pub struct RecordingVcs {
    enabled: bool,
    mode: Mode,
    commits: Mutex<Vec<(Vec<String>, String)>>,
}

impl RecordingVcs {
    fn with(enabled: bool, mode: Mode) -> Self {
        Self { enabled, mode, commits: Mutex::new(Vec::new()) }
    }

    pub fn committing() -> Self {
        Self::with(true, Mode::Commit)
    }

    pub fn disabled() -> Self {
        Self::with(false, Mode::Commit)
    }

    pub fn declining() -> Self {
        Self::with(true, Mode::Decline)
    }

    pub fn failing() -> Self {
        Self::with(true, Mode::Fail)
    }

    pub fn commits(&self) -> Vec<(Vec<String>, String)> {
        self.commits.lock().unwrap().clone()
    }
}

#[async_trait]
impl VersionControl for RecordingVcs {
    fn enabled(&self) -> bool {
        self.enabled
    }

    async fn create_commit(&self, paths: &[String], message: &str) -> Result<bool> {
        self.commits
            .lock()
            .unwrap()
            .push((paths.to_vec(), message.to_string()));
        match self.mode {
            Mode::Commit => Ok(true),
            Mode::Decline => Ok(false),
            Mode::Fail => bail!("repository locked"),
        }
    }
}
