//! Config defaults: applies sensible default values to parsed config.

use crate::schema::{LoggingConfig, PipelineConfig, TagScanConfig, VisionConfig};

/// Default provider: OpenRouter's OpenAI-compatible chat endpoint.
pub const DEFAULT_PROVIDER: &str = "openrouter";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "openai/gpt-5";

/// Default provider base URL.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default Ollama base URL, used when the provider is switched to ollama
/// without an explicit URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default per-layer timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Output-token budget: generous enough that reasoning models do not
/// truncate before answering.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Near-deterministic sampling.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Default image size limit (10 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

pub use tagscan_core::DEFAULT_DUE_SOON_DAYS;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: TagScanConfig) -> TagScanConfig {
    let config = apply_vision_defaults(config);
    let config = apply_pipeline_defaults(config);
    apply_logging_defaults(config)
}

/// Provider, model, endpoint, and sampling settings.
fn apply_vision_defaults(mut config: TagScanConfig) -> TagScanConfig {
    let vision = config.vision.get_or_insert_with(VisionConfig::default);
    let provider = vision
        .provider
        .get_or_insert_with(|| DEFAULT_PROVIDER.to_string())
        .clone();
    if vision.base_url.is_none() {
        let url = if provider == "ollama" { DEFAULT_OLLAMA_URL } else { DEFAULT_BASE_URL };
        vision.base_url = Some(url.to_string());
    }
    vision.model.get_or_insert_with(|| DEFAULT_MODEL.to_string());
    vision.timeout_secs.get_or_insert(DEFAULT_TIMEOUT_SECS);
    vision.max_tokens.get_or_insert(DEFAULT_MAX_TOKENS);
    vision.temperature.get_or_insert(DEFAULT_TEMPERATURE);
    config
}

fn apply_pipeline_defaults(mut config: TagScanConfig) -> TagScanConfig {
    let pipeline = config.pipeline.get_or_insert_with(PipelineConfig::default);
    pipeline.max_image_bytes.get_or_insert(DEFAULT_MAX_IMAGE_BYTES);
    pipeline.due_soon_days.get_or_insert(DEFAULT_DUE_SOON_DAYS);
    config
}

/// Default logging level, directory, and redaction on.
fn apply_logging_defaults(mut config: TagScanConfig) -> TagScanConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.dir.get_or_insert_with(|| DEFAULT_LOG_DIR.to_string());
    logging.redact_sensitive.get_or_insert(true);
    config
}
