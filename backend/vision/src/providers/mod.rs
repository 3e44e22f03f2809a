pub mod mock;
pub mod ollama;
pub mod openrouter;

use std::collections::HashMap;
use std::sync::Arc;

use tagscan_config::VisionConfig;
use tagscan_core::{TagScanError, VisionProvider};

use self::ollama::OllamaProvider;
use self::openrouter::OpenRouterProvider;

/// Registry of vision providers, looked up by name.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn VisionProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider by name.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn VisionProvider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn VisionProvider>, TagScanError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| TagScanError::UnknownProvider(name.to_string()))
    }

    /// A registry holding whichever network providers the config can build.
    pub fn from_config(config: &VisionConfig) -> Self {
        let mut registry = Self::new();
        if let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            let mut provider = OpenRouterProvider::new(key);
            if config.provider_name() == "openrouter" {
                provider = provider.with_base_url(config.endpoint());
            }
            registry.register("openrouter", Arc::new(provider));
        }
        let ollama = match config.provider_name() {
            "ollama" => OllamaProvider::new().with_base_url(config.endpoint()),
            _ => OllamaProvider::new(),
        };
        registry.register("ollama", Arc::new(ollama));
        registry
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the provider the config selects.
///
/// An `openrouter` config without an API key is unusable and rejected here
/// rather than degrading every layer at call time.
pub fn build_provider(config: &VisionConfig) -> Result<Arc<dyn VisionProvider>, TagScanError> {
    let name = config.provider_name();
    let registry = ProviderRegistry::from_config(config);
    match registry.get(name) {
        Err(TagScanError::UnknownProvider(_)) if name == "openrouter" => Err(
            TagScanError::ConfigError("openrouter requires vision.apiKey or OPENROUTER_API_KEY".into()),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::{MockProvider, MockReply};

    #[test]
    fn test_registry_lookup() {
        let mut registry = ProviderRegistry::new();
        registry.register("mock", Arc::new(MockProvider::new(MockReply::direct("ok"))));

        assert_eq!(registry.get("mock").unwrap().name(), "mock");
        assert!(matches!(
            registry.get("missing"),
            Err(TagScanError::UnknownProvider(name)) if name == "missing"
        ));
    }

    #[test]
    fn builds_selected_provider() {
        let config = VisionConfig {
            api_key: Some("sk-or-test".into()),
            ..Default::default()
        };
        assert_eq!(build_provider(&config).unwrap().name(), "openrouter");

        let config = VisionConfig {
            provider: Some("ollama".into()),
            ..Default::default()
        };
        assert_eq!(build_provider(&config).unwrap().name(), "ollama");
    }

    #[test]
    fn openrouter_without_key_is_a_config_error() {
        let err = build_provider(&VisionConfig::default()).err().unwrap();
        assert!(matches!(err, TagScanError::ConfigError(_)));
    }

    #[test]
    fn unknown_provider_name_is_rejected() {
        let config = VisionConfig {
            provider: Some("carrier-pigeon".into()),
            ..Default::default()
        };
        let err = build_provider(&config).err().unwrap();
        assert!(matches!(err, TagScanError::UnknownProvider(_)));
    }
}
