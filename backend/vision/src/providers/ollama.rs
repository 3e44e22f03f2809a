use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tagscan_core::{VisionProvider, VisionRequest, VisionResponse};

/// Ollama local vision provider.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct OllamaChatMessage {
    role: String,
    content: String,
    /// Raw base64 payloads, no data-URI prefix.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    thinking: Option<String>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

fn build_body(request: &VisionRequest) -> OllamaChatRequest {
    let mut messages = Vec::new();
    if !request.system_prompt.is_empty() {
        messages.push(OllamaChatMessage {
            role: "system".to_string(),
            content: request.system_prompt.clone(),
            images: Vec::new(),
        });
    }
    messages.push(OllamaChatMessage {
        role: "user".to_string(),
        content: request.user_prompt.clone(),
        images: vec![request.image_base64().to_string()],
    });

    // Strip any provider prefix like "openai/"
    let model = request
        .model
        .split('/')
        .last()
        .unwrap_or(&request.model)
        .to_string();

    OllamaChatRequest {
        model,
        messages,
        stream: false,
        options: OllamaOptions {
            temperature: request.temperature,
            num_predict: request.max_tokens,
        },
    }
}

#[async_trait]
impl VisionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse> {
        let start = Instant::now();
        let body = build_body(request);
        let model = body.model.clone();

        debug!(model = %model, "Sending request to Ollama");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {}: {}", status, error_body);
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        let tokens_used = chat_response.eval_count.unwrap_or(0)
            + chat_response.prompt_eval_count.unwrap_or(0);

        Ok(VisionResponse {
            content: chat_response.message.content,
            reasoning: chat_response.message.thinking,
            provider: "ollama".to_string(),
            model,
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_sends_raw_base64_and_bare_model_name() {
        let request = VisionRequest {
            model: "library/llava".into(),
            system_prompt: String::new(),
            user_prompt: "What month?".into(),
            image_url: "data:image/jpeg;base64,/9j/4AAQ".into(),
            max_tokens: 500,
            temperature: 0.1,
        };
        let body = serde_json::to_value(build_body(&request)).unwrap();

        assert_eq!(body["model"], "llava");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["images"], json!(["/9j/4AAQ"]));
        assert_eq!(body["options"]["num_predict"], 500);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn thinking_maps_to_reasoning() {
        let raw = json!({"message": {"role": "assistant", "content": "", "thinking": "Answer: 6"}});
        let parsed: OllamaChatResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.message.content, "");
        assert_eq!(parsed.message.thinking.as_deref(), Some("Answer: 6"));
    }
}
