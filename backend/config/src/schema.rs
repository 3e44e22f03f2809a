//! TagScan runtime configuration schema.
//!
//! Every field is optional on disk; [`crate::defaults`] fills the gaps and the
//! accessor methods below fall back to the same defaults, so a partially
//! prepared config is still usable.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::defaults::{
    DEFAULT_BASE_URL, DEFAULT_DUE_SOON_DAYS, DEFAULT_LOG_DIR, DEFAULT_LOG_LEVEL,
    DEFAULT_MAX_IMAGE_BYTES, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_OLLAMA_URL,
    DEFAULT_PROVIDER, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for TagScan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagScanConfig {
    /// Vision model provider and sampling settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<VisionConfig>,

    /// Input limits and record post-processing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineConfig>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl TagScanConfig {
    pub fn vision(&self) -> VisionConfig {
        self.vision.clone().unwrap_or_default()
    }

    pub fn pipeline(&self) -> PipelineConfig {
        self.pipeline.clone().unwrap_or_default()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Vision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionConfig {
    /// "openrouter" (any OpenAI-compatible endpoint) or "ollama"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-layer call timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Replaces the built-in tag-reading system instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl VisionConfig {
    pub fn provider_name(&self) -> &str {
        self.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    pub fn model_id(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn endpoint(&self) -> &str {
        match self.base_url.as_deref() {
            Some(url) => url,
            None if self.provider_name() == "ollama" => DEFAULT_OLLAMA_URL,
            None => DEFAULT_BASE_URL,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn sampling_temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Largest accepted image file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_image_bytes: Option<u64>,
    /// Look-ahead window for "due soon" classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_soon_days: Option<i64>,
}

impl PipelineConfig {
    pub fn image_limit(&self) -> u64 {
        self.max_image_bytes.unwrap_or(DEFAULT_MAX_IMAGE_BYTES)
    }

    pub fn due_soon_window(&self) -> i64 {
        self.due_soon_days.unwrap_or(DEFAULT_DUE_SOON_DAYS)
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the rolling JSON log file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Scrub tokens and phone numbers from model-derived log fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redact_sensitive: Option<bool>,
}

impl LoggingConfig {
    pub fn level_or_default(&self) -> &str {
        self.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn dir_or_default(&self) -> &str {
        self.dir.as_deref().unwrap_or(DEFAULT_LOG_DIR)
    }
}
