use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tagscan_core::{VisionProvider, VisionRequest, VisionResponse};

/// What the mock does for a matching request.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer on the direct channel.
    Direct(String),
    /// Empty direct answer, text on the reasoning channel.
    Reasoning(String),
    /// Provider error with this message.
    Fail(String),
    /// Never answer.
    Hang,
}

impl MockReply {
    pub fn direct(answer: impl Into<String>) -> Self {
        Self::Direct(answer.into())
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning(text.into())
    }
}

/// A mock vision provider that returns canned replies keyed on a prompt substring.
pub struct MockProvider {
    rules: Vec<(String, MockReply)>,
    fallback: MockReply,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(fallback: MockReply) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `reply` when the user prompt contains `needle`. First match wins.
    pub fn on(mut self, needle: impl Into<String>, reply: MockReply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// User prompts seen so far, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn reply_for(&self, prompt: &str) -> &MockReply {
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.fallback)
    }
}

#[async_trait]
impl VisionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.user_prompt.clone());
        }

        let (content, reasoning) = match self.reply_for(&request.user_prompt) {
            MockReply::Direct(answer) => (answer.clone(), None),
            MockReply::Reasoning(text) => (String::new(), Some(text.clone())),
            MockReply::Fail(message) => anyhow::bail!("mock failure: {message}"),
            MockReply::Hang => std::future::pending().await,
        };

        Ok(VisionResponse {
            content,
            reasoning,
            provider: "mock".to_string(),
            model: request.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}
