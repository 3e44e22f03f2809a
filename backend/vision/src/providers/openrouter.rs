use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tagscan_core::{VisionProvider, VisionRequest, VisionResponse};

/// OpenRouter.ai (or any OpenAI-compatible) vision provider.
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

/// Reasoning models may leave `content` null or empty and put their
/// thinking in `reasoning` (OpenRouter) or `reasoning_content` (others).
#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

fn build_body(request: &VisionRequest) -> ChatRequest {
    let mut messages = Vec::new();
    if !request.system_prompt.is_empty() {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: MessageContent::Text(request.system_prompt.clone()),
        });
    }
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: MessageContent::Parts(vec![
            ContentPart::Text {
                text: request.user_prompt.clone(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: request.image_url.clone(),
                },
            },
        ]),
    });

    ChatRequest {
        model: request.model.clone(),
        messages,
        max_tokens: Some(request.max_tokens),
        temperature: Some(request.temperature),
    }
}

fn into_response(chat_response: ChatResponse, model: &str, latency_ms: u64) -> Result<VisionResponse> {
    let tokens_used = chat_response
        .usage
        .and_then(|u| u.total_tokens)
        .unwrap_or(0);

    let message = chat_response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .context("OpenRouter response contained no choices")?;

    let reasoning = message
        .reasoning
        .filter(|r| !r.trim().is_empty())
        .or(message.reasoning_content);

    Ok(VisionResponse {
        content: message.content.unwrap_or_default(),
        reasoning,
        provider: "openrouter".to_string(),
        model: model.to_string(),
        tokens_used,
        latency_ms,
    })
}

#[async_trait]
impl VisionProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse> {
        let start = Instant::now();
        let body = build_body(request);

        debug!(
            model = %request.model,
            image_uri_len = request.image_url.len(),
            "Sending request to OpenRouter"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("OpenRouter HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenRouter returned {}: {}", status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenRouter response")?;

        into_response(chat_response, &request.model, start.elapsed().as_millis() as u64)
    }
}
