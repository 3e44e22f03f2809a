use anyhow::Result;
use async_trait::async_trait;

/// Trait for vision-capable model providers used by the layer invoker.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name (e.g., "openrouter", "ollama").
    fn name(&self) -> &str;

    /// Send one instruction plus one image and return the model's answer.
    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse>;
}

/// Request to a vision provider: one system turn, one user turn carrying
/// a text prompt and an image reference.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    /// `data:<mime>;base64,<payload>` URI.
    pub image_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl VisionRequest {
    /// The base64 payload of `image_url`, for providers that take raw images.
    pub fn image_base64(&self) -> &str {
        self.image_url
            .split_once(";base64,")
            .map(|(_, payload)| payload)
            .unwrap_or(&self.image_url)
    }
}

/// Response from a vision provider.
#[derive(Debug, Clone, Default)]
pub struct VisionResponse {
    /// Direct answer; may be empty when the model only produced reasoning.
    pub content: String,
    /// Secondary reasoning channel, if the provider exposes one.
    pub reasoning: Option<String>,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
