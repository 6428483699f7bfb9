//! Config defaults: fills every unset field so downstream code sees a
//! complete config.

use crate::schema::{EditorConfig, LoggingConfig, ScribeConfig, VersionControlConfig};
use scribeforge_core::DEFAULT_MAX_DIFF_BYTES;

/// Default log level when neither the file nor `RUST_LOG` says otherwise.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log directory, relative to the config dir.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: ScribeConfig) -> ScribeConfig {
    let config = apply_editor_defaults(config);
    let config = apply_version_control_defaults(config);
    apply_logging_defaults(config)
}

fn apply_editor_defaults(mut config: ScribeConfig) -> ScribeConfig {
    let editor = config.editor.get_or_insert_with(EditorConfig::default);
    if editor.dry_run.is_none() {
        editor.dry_run = Some(false);
    }
    // A zero limit would reject every diff.
    if editor.max_diff_bytes.map_or(true, |n| n == 0) {
        editor.max_diff_bytes = Some(DEFAULT_MAX_DIFF_BYTES);
    }
    config
}

fn apply_version_control_defaults(mut config: ScribeConfig) -> ScribeConfig {
    let vc = config
        .version_control
        .get_or_insert_with(VersionControlConfig::default);
    if vc.enabled.is_none() {
        vc.enabled = Some(true);
    }
    config
}

fn apply_logging_defaults(mut config: ScribeConfig) -> ScribeConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.dir.is_none() {
        logging.dir = Some(DEFAULT_LOG_DIR.to_string());
    }
    config
}
