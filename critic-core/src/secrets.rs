//! Secrets management for critic
//!
//! Secrets are stored separately from configuration to avoid accidental
//! sharing. The secrets file is located at `~/.config/critic/secrets.toml`
//! and must have restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (OPENROUTER_API_KEY, OPENAI_API_KEY,
//!    ANTHROPIC_API_KEY, WATSONX_API_KEY, GITHUB_TOKEN)
//! 2. Secrets file (~/.config/critic/secrets.toml)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderKind;
use crate::{Error, Result};

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// Per-provider API keys
    pub providers: ProviderSecrets,

    /// GitHub configuration
    pub github: GitHubSecrets,
}

/// API keys for model providers
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderSecrets {
    pub openrouter_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub watsonx_api_key: Option<String>,
}

/// GitHub-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubSecrets {
    /// GitHub Personal Access Token
    pub token: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        // Check file permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            // Check if file is readable by group or others (mode & 0o077)
            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        secrets.trim_all();
        Ok(secrets)
    }

    fn trim_all(&mut self) {
        for slot in [
            &mut self.providers.openrouter_api_key,
            &mut self.providers.openai_api_key,
            &mut self.providers.anthropic_api_key,
            &mut self.providers.watsonx_api_key,
            &mut self.github.token,
        ] {
            if let Some(ref mut value) = slot {
                *value = value.trim().to_string();
            }
        }
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/critic/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("critic").join("secrets.toml"))
    }

    /// Get the API key for a provider, with environment variable override
    ///
    /// Priority: provider env var > secrets file
    pub fn provider_api_key(&self, kind: ProviderKind) -> Option<String> {
        let (env_var, file_value) = match kind {
            ProviderKind::OpenRouter => {
                ("OPENROUTER_API_KEY", &self.providers.openrouter_api_key)
            }
            ProviderKind::OpenAi => ("OPENAI_API_KEY", &self.providers.openai_api_key),
            ProviderKind::Anthropic => ("ANTHROPIC_API_KEY", &self.providers.anthropic_api_key),
            ProviderKind::Watsonx => ("WATSONX_API_KEY", &self.providers.watsonx_api_key),
        };

        if let Ok(key) = std::env::var(env_var) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                debug!(provider = %kind, "Using API key from environment");
                return Some(key);
            }
        }

        file_value
            .as_ref()
            .filter(|k| !k.is_empty())
            .cloned()
            .inspect(|_| debug!(provider = %kind, "Using API key from secrets file"))
    }

    /// Get GitHub token with environment variable override
    ///
    /// Priority: GITHUB_TOKEN env var > secrets file
    pub fn github_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            let token = token.trim().to_string();
            if !token.is_empty() {
                debug!("Using GitHub token from GITHUB_TOKEN environment variable");
                return Some(token);
            }
        }

        self.github
            .token
            .as_ref()
            .filter(|t| !t.is_empty())
            .cloned()
    }
}
