//! `scribeforge-config`: ScribeForge runtime configuration.
//!
//! Provides:
//! - Typed config schema (editor, version control, logging)
//! - YAML read/write with atomic replace
//! - `${ENV_VAR}` substitution and environment overrides
//! - Default value application

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;

pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides, apply_env_overrides_with, resolve_env_vars, resolve_env_vars_with,
    MissingEnvVarError, DRY_RUN_ENV,
};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use schema::{EditorConfig, LoggingConfig, ScribeConfig, VersionControlConfig};

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load, substitute env vars, apply defaults and environment overrides.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<ScribeConfig> {
    let raw_config = load_config(path).await?;

    let value: Value = serde_json::to_value(&raw_config)
        .context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;

    let config: ScribeConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    Ok(apply_env_overrides(apply_all_defaults(config)))
}
