//! ScribeForge runtime configuration schema.
//!
//! Typed for serde YAML/JSON deserialization. Every section is optional so a
//! partial file (or none at all) still loads; `apply_all_defaults` fills gaps.

use scribeforge_core::{EditorSettings, DEFAULT_MAX_DIFF_BYTES};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScribeConfig {
    /// Patch editor behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<EditorConfig>,

    /// Checkpoint commits after mutating actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_control: Option<VersionControlConfig>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl ScribeConfig {
    /// Editor section, or the built-in defaults when absent.
    pub fn editor(&self) -> EditorConfig {
        self.editor.clone().unwrap_or_default()
    }

    pub fn version_control_enabled(&self) -> bool {
        self.version_control
            .as_ref()
            .and_then(|vc| vc.enabled)
            .unwrap_or(true)
    }

    pub fn commit_prefix(&self) -> Option<String> {
        self.version_control
            .as_ref()
            .and_then(|vc| vc.commit_prefix.clone())
            .filter(|p| !p.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Compute patches without writing them back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,

    /// Largest diff text accepted by `apply_diff`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_diff_bytes: Option<usize>,
}

impl EditorSettings for EditorConfig {
    fn dry_run(&self) -> bool {
        self.dry_run.unwrap_or(false)
    }

    fn max_diff_bytes(&self) -> usize {
        self.max_diff_bytes
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_DIFF_BYTES)
    }
}

// ---------------------------------------------------------------------------
// Version control
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionControlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Prepended to checkpoint commit messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_prefix: Option<String>,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for the rolling JSON log, relative to the config dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}
