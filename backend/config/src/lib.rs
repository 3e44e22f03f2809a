//! `tagscan-config` — runtime configuration for the tag-scanning pipeline.
//!
//! Provides:
//! - Typed config schema (vision provider, pipeline limits, logging)
//! - YAML read/write with atomic replace
//! - `${ENV_VAR}` / `${ENV_VAR:-default}` substitution
//! - Environment overrides for credentials and model selection
//! - Default value application
//! - Validation with errors and warnings
//! - Config redaction for safe logging/display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use schema::{LoggingConfig, PipelineConfig, TagScanConfig, VisionConfig};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use env::{apply_env_overrides, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use redact::redact;
pub use defaults::apply_all_defaults;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load a config file and run it through [`prepare`] with the process
/// environment.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<TagScanConfig> {
    let raw_config = load_config(path).await?;
    let env: HashMap<String, String> = std::env::vars().collect();
    let config = prepare(raw_config, &env)?;

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }

    Ok(config)
}

/// Substitute env vars, apply env overrides, then fill defaults.
pub fn prepare(config: TagScanConfig, env: &HashMap<String, String>) -> Result<TagScanConfig> {
    let value: Value =
        serde_json::to_value(&config).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    let config: TagScanConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_env_overrides(config, env);
    Ok(apply_all_defaults(config))
}
