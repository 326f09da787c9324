//! Configuration management for critic
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (CRITIC_*)
//! 3. Config file (~/.config/critic/config.toml)
//! 4. Default values

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which model backend to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenRouter (OpenAI-compatible API, default)
    #[default]
    OpenRouter,
    /// OpenAI
    OpenAi,
    /// Anthropic
    Anthropic,
    /// IBM watsonx.ai
    Watsonx,
}

impl ProviderKind {
    /// Get the short name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Watsonx => "watsonx",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "watsonx" => Ok(ProviderKind::Watsonx),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Provider-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Backend to send completions to
    pub kind: ProviderKind,

    /// Model identifier
    pub model: String,

    /// Override the backend's base URL
    pub base_url: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens per completion
    pub max_tokens: u32,

    /// watsonx.ai project id (watsonx only)
    pub watsonx_project_id: Option<String>,

    /// watsonx.ai region host, e.g. us-south.ml.cloud.ibm.com (watsonx only)
    pub watsonx_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::OpenRouter,
            model: "deepseek/deepseek-chat-v3.1:free".to_string(),
            base_url: None,
            temperature: 0.5,
            max_tokens: 500,
            watsonx_project_id: None,
            watsonx_url: None,
        }
    }
}

/// Retry and timeout policy for provider calls
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts per call, including the first
    pub max_attempts: u32,

    /// Initial backoff delay, doubled per attempt
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,

    /// Ceiling for the backoff delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Per-call timeout; exceeding it counts as a retryable timeout
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(800),
            max_delay: Duration::from_secs(30),
            call_timeout: Duration::from_secs(60),
        }
    }
}

/// Review pipeline tunables
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// File cap in full mode
    pub max_files_full: usize,

    /// File cap in quick mode
    pub max_files_quick: usize,

    /// Character budget for the diff portion of one prompt
    pub max_prompt_chars: usize,

    /// Line distance within which two same-category findings on one
    /// file are considered duplicates
    pub dedup_line_tolerance: u32,

    /// Maximum in-flight provider calls per request
    pub max_concurrency: usize,

    /// Outer deadline for one review request
    #[serde(with = "humantime_serde")]
    pub request_deadline: Duration,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_files_full: 5,
            max_files_quick: 3,
            max_prompt_chars: 5000,
            dedup_line_tolerance: 1,
            max_concurrency: 4,
            request_deadline: Duration::from_secs(300),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Provider configuration
    pub provider: ProviderConfig,

    /// Retry policy
    pub retry: RetryConfig,

    /// Review tunables
    pub review: ReviewConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/critic/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("critic").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - CRITIC_PROVIDER: backend to use (openrouter, openai, anthropic, watsonx)
    /// - CRITIC_MODEL: model identifier
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(provider) = std::env::var("CRITIC_PROVIDER") {
            if let Ok(kind) = provider.parse() {
                self.provider.kind = kind;
            }
        }

        if let Ok(model) = std::env::var("CRITIC_MODEL") {
            self.provider.model = model;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        provider: Option<ProviderKind>,
        model: Option<String>,
    ) -> Self {
        if let Some(kind) = provider {
            self.provider.kind = kind;
        }

        if let Some(m) = model {
            self.provider.model = m;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        provider: Option<ProviderKind>,
        model: Option<String>,
    ) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(provider, model))
    }
}
