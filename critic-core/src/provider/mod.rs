//! Provider abstraction for interchangeable model backends
//!
//! The orchestrator depends only on the [`Provider`] trait; which
//! backend is active is a configuration-time choice.

mod backends;
mod retry;
mod token_cache;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{ProviderConfig, ProviderKind};
use crate::secrets::Secrets;

pub use backends::{AnthropicProvider, OpenAiProvider, WatsonxProvider};
pub use retry::call_with_retry;
pub use token_cache::{CachedToken, TokenCache};

/// Result type for provider operations
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Errors from a model backend call
///
/// `Clone` so per-pair failure records can be summarized after dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The backend rejected the call due to rate limiting
    #[error("rate limited by provider")]
    RateLimited,

    /// Credentials were missing, invalid, or expired
    #[error("provider authentication failed: {0}")]
    Auth(String),

    /// The call did not complete within the per-call timeout, or the
    /// backend reported a transient failure
    #[error("provider call timed out")]
    Timeout,

    /// Permanent failure; never retried
    #[error("provider error: {0}")]
    Fatal(String),
}

impl ProviderError {
    /// Whether the retry loop may try this call again
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited | ProviderError::Timeout)
    }

    /// Short kind tag used in failure summaries
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::RateLimited => "rate_limited",
            ProviderError::Auth(_) => "auth",
            ProviderError::Timeout => "timeout",
            ProviderError::Fatal(_) => "fatal",
        }
    }
}

/// Trait for model backends
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the name of this backend
    fn name(&self) -> &'static str;

    /// Send a prompt and return the completion text
    async fn complete(&self, system_prompt: &str, content: &str) -> ProviderResult<String>;

    /// Check whether the backend has the credentials and settings it needs
    fn is_configured(&self) -> bool;

    /// Drop any cached credentials so the next call re-authenticates
    ///
    /// No-op for backends that send a static API key per request.
    async fn invalidate_credentials(&self) {}
}

/// Build the configured backend
///
/// Missing credentials do not fail construction; the provider reports
/// them through `is_configured` and fails calls with an auth error, so
/// health checks can inspect configuration without a model call.
pub fn build_provider(
    config: &ProviderConfig,
    secrets: &Secrets,
    token_cache: Arc<TokenCache>,
) -> Box<dyn Provider> {
    let api_key = secrets.provider_api_key(config.kind);
    match config.kind {
        ProviderKind::OpenRouter => Box::new(OpenAiProvider::openrouter(api_key, config)),
        ProviderKind::OpenAi => Box::new(OpenAiProvider::openai(api_key, config)),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(api_key, config)),
        ProviderKind::Watsonx => Box::new(WatsonxProvider::new(api_key, config, token_cache)),
    }
}
