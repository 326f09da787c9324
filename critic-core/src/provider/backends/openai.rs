//! OpenAI-compatible chat-completions backend
//!
//! Covers both OpenAI itself and OpenRouter, which exposes the same
//! API under a different base URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::provider::{Provider, ProviderError, ProviderResult};

use super::{map_status, map_transport};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Backend speaking the OpenAI chat-completions API
pub struct OpenAiProvider {
    name: &'static str,
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiProvider {
    /// Create a backend for OpenRouter
    pub fn openrouter(api_key: Option<String>, config: &ProviderConfig) -> Self {
        // OpenRouter model ids may carry a ":free" routing suffix that
        // the completions endpoint does not accept.
        let model = config
            .model
            .strip_suffix(":free")
            .unwrap_or(&config.model)
            .to_string();
        Self::build("openrouter", api_key, config, OPENROUTER_BASE_URL, model)
    }

    /// Create a backend for OpenAI
    pub fn openai(api_key: Option<String>, config: &ProviderConfig) -> Self {
        Self::build(
            "openai",
            api_key,
            config,
            OPENAI_BASE_URL,
            config.model.clone(),
        )
    }

    fn build(
        name: &'static str,
        api_key: Option<String>,
        config: &ProviderConfig,
        default_base_url: &str,
        model: String,
    ) -> Self {
        Self {
            name,
            client: reqwest::Client::new(),
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| default_base_url.to_string()),
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Override the base URL (builder style)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the model (builder style)
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn complete(&self, system_prompt: &str, content: &str) -> ProviderResult<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::Auth(format!("no API key configured for {}", self.name))
        })?;

        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content,
                },
            ],
        };

        debug!(provider = self.name, model = %self.model, "sending completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Fatal(format!("malformed completion response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Fatal("completion had no choices".to_string()))
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig::default()
    }

    #[test]
    fn test_openrouter_strips_free_suffix() {
        let provider = OpenAiProvider::openrouter(None, &config());
        assert_eq!(provider.model, "deepseek/deepseek-chat-v3.1");
        assert_eq!(provider.base_url, OPENROUTER_BASE_URL);
        assert_eq!(provider.name(), "openrouter");
    }

    #[test]
    fn test_openai_defaults() {
        let provider = OpenAiProvider::openai(Some("sk-test".to_string()), &config());
        assert_eq!(provider.base_url, OPENAI_BASE_URL);
        assert!(provider.is_configured());
    }

    #[test]
    fn test_builder_overrides() {
        let provider = OpenAiProvider::openai(None, &config())
            .with_base_url("http://localhost:8080/v1")
            .with_model("gpt-4o-mini");
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
        assert_eq!(provider.model, "gpt-4o-mini");
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn test_missing_key_is_auth_error() {
        let provider = OpenAiProvider::openrouter(None, &config());
        let result = provider.complete("sys", "content").await;
        assert!(matches!(result, Err(ProviderError::Auth(_))));
    }
}
