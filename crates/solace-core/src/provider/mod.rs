pub mod openai_compat;

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::types::{CompletionResponse, Message};

/// Trait for LLM providers. The pipeline hands over a finished instruction
/// bundle; timeouts and transport failures are the provider's concern.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request.
    async fn chat(
        &self,
        messages: &[Message],
        model: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;
}

/// Create a provider from config. Returns `None` when no API key is set.
pub fn create_provider(cfg: &ProviderConfig) -> Option<Box<dyn LlmProvider>> {
    let key = cfg.api_key.trim();
    if key.is_empty() {
        return None;
    }
    Some(Box::new(openai_compat::OpenAiCompatProvider::new(
        key.to_string(),
        cfg.api_base.clone(),
        cfg.model.clone(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_requires_key() {
        let cfg = ProviderConfig::default();
        assert!(create_provider(&cfg).is_none());

        let cfg = ProviderConfig {
            api_key: "sk-test".to_string(),
            model: "gpt-4o".to_string(),
            ..ProviderConfig::default()
        };
        let provider = create_provider(&cfg).unwrap();
        assert_eq!(provider.default_model(), "gpt-4o");
    }
}
