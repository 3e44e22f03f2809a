//! Environment variable handling for config values.
//!
//! Two mechanisms:
//! - `${VAR}` and `${VAR:-fallback}` references in string values, resolved
//!   at load time. Only uppercase `[A-Z_][A-Z0-9_]*` names are matched and
//!   `$${VAR}` escapes to a literal `${VAR}`.
//! - Direct overrides (`OPENROUTER_API_KEY`, `TAGSCAN_MODEL_ID`, ...) that
//!   win over whatever the file says.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{TagScanConfig, VisionConfig};

/// An escaped reference, or a reference with an optional `:-` fallback.
static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\$\{[A-Z_][A-Z0-9_]*(?::-[^}]*)?\}|\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .unwrap()
});

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references using the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute `${VAR}` references in every string leaf of `value`.
///
/// A reference to an unset or empty variable without a fallback is an error.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    resolve_at(value, env, "")
}

fn resolve_at(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    Ok(match value {
        Value::String(s) => Value::String(resolve_string(s, env, path)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| resolve_at(v, env, &format!("{path}[{i}]")))
                .collect::<Result<_>>()?,
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                let child = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                out.insert(key.clone(), resolve_at(v, env, &child)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}

fn resolve_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing: Option<String> = None;
    let resolved = REFERENCE_PATTERN.replace_all(s, |caps: &Captures| {
        let whole = &caps[0];
        if whole.starts_with("$$") {
            return whole[1..].to_string();
        }
        let name = &caps[1];
        match env.get(name).filter(|v| !v.is_empty()) {
            Some(val) => val.clone(),
            None => match caps.get(2) {
                Some(fallback) => fallback.as_str().to_string(),
                None => {
                    missing.get_or_insert_with(|| name.to_string());
                    String::new()
                }
            },
        }
    });

    if let Some(var_name) = missing {
        bail!(MissingEnvVarError {
            var_name,
            config_path: path.to_string(),
        });
    }
    Ok(resolved.into_owned())
}

/// Apply environment overrides for the settings operators most often change
/// without editing the file.
pub fn apply_env_overrides(mut config: TagScanConfig, env: &HashMap<String, String>) -> TagScanConfig {
    let get = |key: &str| env.get(key).filter(|v| !v.trim().is_empty()).cloned();
    let vision = config.vision.get_or_insert_with(VisionConfig::default);

    if let Some(key) = get("TAGSCAN_API_KEY").or_else(|| get("OPENROUTER_API_KEY")) {
        vision.api_key = Some(key);
    }
    if let Some(model) = get("TAGSCAN_MODEL_ID").or_else(|| get("MODEL_ID")) {
        vision.model = Some(model);
    }
    if let Some(provider) = get("TAGSCAN_PROVIDER") {
        vision.provider = Some(provider);
    }
    if let Some(url) = get("TAGSCAN_BASE_URL") {
        vision.base_url = Some(url);
    }
    if let Some(secs) = get("TAGSCAN_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
        vision.timeout_secs = Some(secs);
    }
    config
}
