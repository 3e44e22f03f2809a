//! Config validation: checks with user-friendly error messages.

use crate::schema::TagScanConfig;
use thiserror::Error;

/// Providers the vision crate knows how to build.
pub const KNOWN_PROVIDERS: &[&str] = &["openrouter", "ollama"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &TagScanConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_vision(config, &mut report);
    validate_pipeline(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_vision(config: &TagScanConfig, report: &mut ValidationReport) {
    let vision = config.vision();
    let provider = vision.provider_name();

    if !KNOWN_PROVIDERS.contains(&provider) {
        report.error(
            "vision.provider",
            format!("Unknown provider '{provider}'; expected one of {KNOWN_PROVIDERS:?}"),
        );
    }
    if provider == "openrouter" && vision.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        report.error(
            "vision.apiKey",
            "No API key configured; every layer would degrade to 'unknown'",
        );
    }
    if vision.model_id().trim().is_empty() {
        report.error("vision.model", "Model id cannot be empty");
    }
    let url = vision.endpoint();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        report.error("vision.baseUrl", format!("'{url}' is not an http(s) URL"));
    }
    if vision.timeout_secs == Some(0) {
        report.error("vision.timeoutSecs", "timeoutSecs must be > 0");
    }
    match vision.max_tokens {
        Some(0) => report.error("vision.maxTokens", "maxTokens must be > 0"),
        Some(n) if n < 256 => report.warn(
            "vision.maxTokens",
            format!("maxTokens {n} is low; reasoning models may truncate before answering"),
        ),
        _ => {}
    }
    let temperature = vision.sampling_temperature();
    if !(0.0..=2.0).contains(&temperature) {
        report.error("vision.temperature", "temperature must be within 0.0..=2.0");
    } else if temperature > 0.5 {
        report.warn(
            "vision.temperature",
            format!("temperature {temperature} makes field answers less repeatable"),
        );
    }
}

fn validate_pipeline(config: &TagScanConfig, report: &mut ValidationReport) {
    let Some(pipeline) = &config.pipeline else { return };
    if pipeline.max_image_bytes == Some(0) {
        report.error("pipeline.maxImageBytes", "maxImageBytes must be > 0");
    }
    if let Some(days) = pipeline.due_soon_days {
        if days < 0 {
            report.error("pipeline.dueSoonDays", "dueSoonDays cannot be negative");
        }
    }
}

fn validate_logging(config: &TagScanConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(level) = &logging.level {
        let known = ["trace", "debug", "info", "warn", "error"];
        if !known.contains(&level.to_lowercase().as_str()) {
            report.warn(
                "logging.level",
                format!("'{level}' is not a plain level; it will be parsed as a filter directive"),
            );
        }
    }
}
