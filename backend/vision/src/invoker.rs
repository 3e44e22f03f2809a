//! The vision layer invoker: one instruction plus one image in, a
//! best-effort answer out.
//!
//! `invoke` never fails. Timeouts, transport and provider errors, and empty
//! answers all come back as [`LayerOutcome::Degraded`], whose answer is the
//! `unknown` sentinel. There are no retries.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use tagscan_config::VisionConfig;
use tagscan_core::{VisionProvider, VisionRequest, VisionResponse, UNKNOWN};
use tagscan_markdown::extract_answer;
use tagscan_media::ImageReference;

/// Fixed system instruction sent with every layer.
pub const SYSTEM_PROMPT: &str = "You are an NFPA-10-savvy fire safety expert analyzing hole-punched \
extinguisher inspection tags. Punched holes mark the inspection year, month and day. Infer the most \
recent complete year/month/day combination from the punches. If multiple days are punched, choose the \
lowest. If a value is unreadable, answer 'unknown'. Always respond with only the exact value requested \
by the user message, with no prose.";

/// Model and sampling settings shared by every layer of one analysis.
#[derive(Debug, Clone)]
pub struct InvokerSettings {
    pub model: String,
    pub system_prompt: String,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl InvokerSettings {
    pub fn from_config(config: &VisionConfig) -> Self {
        Self {
            model: config.model_id().to_string(),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
            timeout: config.timeout(),
            max_tokens: config.max_output_tokens(),
            temperature: config.sampling_temperature(),
        }
    }
}

impl Default for InvokerSettings {
    fn default() -> Self {
        Self::from_config(&VisionConfig::default())
    }
}

/// Why a layer fell back to the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DegradeReason {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("model returned no answer")]
    EmptyAnswer,
    #[error("layer task failed: {0}")]
    TaskFailed(String),
}

/// Result of one layer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerOutcome {
    Direct(String),
    /// Direct channel was empty; the answer was recovered from reasoning.
    FromReasoning(String),
    Degraded(DegradeReason),
}

impl LayerOutcome {
    /// The sentinel-normalized answer the consolidator sees.
    pub fn answer(&self) -> &str {
        match self {
            Self::Direct(answer) | Self::FromReasoning(answer) => answer,
            Self::Degraded(_) => UNKNOWN,
        }
    }

    pub fn into_answer(self) -> String {
        match self {
            Self::Direct(answer) | Self::FromReasoning(answer) => answer,
            Self::Degraded(_) => UNKNOWN.to_string(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// Short label for logs: `direct`, `reasoning` or `degraded`.
    pub fn source(&self) -> &'static str {
        match self {
            Self::Direct(_) => "direct",
            Self::FromReasoning(_) => "reasoning",
            Self::Degraded(_) => "degraded",
        }
    }

    fn from_response(response: VisionResponse) -> Self {
        let direct = response.content.trim();
        if !direct.is_empty() {
            return Self::Direct(direct.to_string());
        }
        match response.reasoning.as_deref().map(str::trim) {
            Some(reasoning) if !reasoning.is_empty() => Self::FromReasoning(extract_answer(reasoning)),
            _ => Self::Degraded(DegradeReason::EmptyAnswer),
        }
    }
}

/// Sends layer prompts to one provider with shared settings.
pub struct VisionInvoker {
    provider: Arc<dyn VisionProvider>,
    settings: InvokerSettings,
}

impl VisionInvoker {
    pub fn new(provider: Arc<dyn VisionProvider>, settings: InvokerSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn settings(&self) -> &InvokerSettings {
        &self.settings
    }

    /// Ask one question about `image`, bounded by the configured timeout.
    pub async fn invoke(&self, layer: &str, prompt: &str, image: &ImageReference) -> LayerOutcome {
        let request = VisionRequest {
            model: self.settings.model.clone(),
            system_prompt: self.settings.system_prompt.clone(),
            user_prompt: prompt.to_string(),
            image_url: image.data_uri(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        debug!(
            layer,
            provider = %self.provider.name(),
            model = %request.model,
            prompt_len = prompt.len(),
            "Invoking vision layer"
        );

        let outcome = match tokio::time::timeout(self.settings.timeout, self.provider.complete(&request)).await {
            Err(_) => LayerOutcome::Degraded(DegradeReason::Timeout(self.settings.timeout)),
            Ok(Err(e)) => LayerOutcome::Degraded(DegradeReason::Provider(format!("{e:#}"))),
            Ok(Ok(response)) => {
                debug!(
                    layer,
                    tokens = response.tokens_used,
                    latency_ms = response.latency_ms,
                    "Vision layer responded"
                );
                LayerOutcome::from_response(response)
            }
        };

        if let LayerOutcome::Degraded(reason) = &outcome {
            warn!(layer, reason = %reason, "Vision layer degraded to unknown");
        }
        outcome
    }
}
