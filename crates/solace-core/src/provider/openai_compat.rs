use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::error::ProviderError;
use crate::types::{CompletionResponse, FinishReason, Message, TokenUsage};
use crate::util::http;

use super::LlmProvider;

/// OpenAI-compatible chat-completions provider.
/// Works with OpenAI, OpenRouter, DeepSeek, Groq and any compatible API.
pub struct OpenAiCompatProvider {
    api_key: String,
    api_base: String,
    default_model: String,
}

impl OpenAiCompatProvider {
    pub fn new(api_key: String, api_base: Option<String>, default_model: String) -> Self {
        let base = api_base.unwrap_or_else(|| {
            let model = default_model.to_lowercase();
            if model.contains("openrouter") {
                "https://openrouter.ai/api/v1".to_string()
            } else if model.contains("deepseek") {
                "https://api.deepseek.com/v1".to_string()
            } else if model.contains("groq") {
                "https://api.groq.com/openai/v1".to_string()
            } else {
                "https://api.openai.com/v1".to_string()
            }
        });

        Self {
            api_key,
            api_base: base.trim_end_matches('/').to_string(),
            default_model,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Strip the "openrouter/" routing prefix the API does not expect.
    fn normalize_model<'a>(&self, model: &'a str) -> &'a str {
        model.strip_prefix("openrouter/").unwrap_or(model)
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn chat(
        &self,
        messages: &[Message],
        model: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<CompletionResponse, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::NoApiKey);
        }
        let url = format!("{}/chat/completions", self.api_base);
        let model_name = self.normalize_model(model);

        let msgs: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();

        let body = json!({
            "model": model_name,
            "messages": msgs,
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        debug!("OpenAI-compat request to {} with model {}", url, model_name);

        let response = http::client()
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let data: serde_json::Value = response.json().await?;
        parse_openai_response(&data)
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

/// Parse an OpenAI-format response into our CompletionResponse.
pub fn parse_openai_response(data: &serde_json::Value) -> Result<CompletionResponse, ProviderError> {
    let choice = data
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;

    let message = choice
        .get("message")
        .ok_or_else(|| ProviderError::Parse("No message in choice".to_string()))?;

    let content = message.get("content").and_then(|v| v.as_str()).map(|s| s.to_string());

    let finish_reason = match choice.get("finish_reason").and_then(|v| v.as_str()) {
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::Error,
        _ => FinishReason::Stop,
    };

    let usage = data
        .get("usage")
        .map(|u| {
            let field = |name: &str| u.get(name).and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            TokenUsage {
                prompt_tokens: field("prompt_tokens"),
                completion_tokens: field("completion_tokens"),
                total_tokens: field("total_tokens"),
            }
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content,
        finish_reason,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_api_base() {
        let p = OpenAiCompatProvider::new("k".into(), None, "gpt-4o-mini".into());
        assert_eq!(p.api_base(), "https://api.openai.com/v1");

        let p = OpenAiCompatProvider::new("k".into(), None, "deepseek-chat".into());
        assert_eq!(p.api_base(), "https://api.deepseek.com/v1");

        let p = OpenAiCompatProvider::new("k".into(), Some("http://localhost:8000/v1/".into()), "m".into());
        assert_eq!(p.api_base(), "http://localhost:8000/v1");
    }

    #[test]
    fn test_normalize_model() {
        let p = OpenAiCompatProvider::new("k".into(), None, "m".into());
        assert_eq!(p.normalize_model("openrouter/openai/gpt-4o"), "openai/gpt-4o");
        assert_eq!(p.normalize_model("gpt-4o"), "gpt-4o");
    }

    #[test]
    fn test_parse_response() {
        let data = json!({
            "choices": [{
                "message": { "role": "assistant", "content": "I'm here for you." },
                "finish_reason": "length"
            }],
            "usage": { "prompt_tokens": 120, "completion_tokens": 600, "total_tokens": 720 }
        });
        let resp = parse_openai_response(&data).unwrap();
        assert_eq!(resp.content.as_deref(), Some("I'm here for you."));
        assert_eq!(resp.finish_reason, FinishReason::Length);
        assert_eq!(resp.usage.total_tokens, 720);
    }

    #[tokio::test]
    async fn test_blank_key_fails_before_request() {
        let p = OpenAiCompatProvider::new("  ".into(), Some("http://127.0.0.1:9/v1".into()), "m".into());
        let result = p.chat(&[Message::user("hi")], "m", 10, 0.7).await;
        assert!(matches!(result, Err(ProviderError::NoApiKey)));
    }

    #[test]
    fn test_parse_response_errors() {
        assert!(matches!(
            parse_openai_response(&json!({})),
            Err(ProviderError::Parse(_))
        ));
        assert!(matches!(
            parse_openai_response(&json!({ "choices": [{}] })),
            Err(ProviderError::Parse(_))
        ));
    }
}
