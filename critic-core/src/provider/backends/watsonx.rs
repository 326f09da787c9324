//! IBM watsonx.ai text-generation backend
//!
//! watsonx does not accept the API key directly; each call carries an
//! IAM bearer token exchanged from the key. Tokens expire after about
//! an hour and are kept in the shared [`TokenCache`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::provider::{CachedToken, Provider, ProviderError, ProviderResult, TokenCache};

use super::{map_status, map_transport};

const IAM_URL: &str = "https://iam.cloud.ibm.com/identity/token";
const GENERATION_VERSION: &str = "2023-05-29";

/// Backend speaking the watsonx.ai text-generation API
pub struct WatsonxProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    project_id: Option<String>,
    host: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    token_cache: Arc<TokenCache>,
}

impl WatsonxProvider {
    /// Create a new watsonx backend sharing the process-wide token cache
    pub fn new(
        api_key: Option<String>,
        config: &ProviderConfig,
        token_cache: Arc<TokenCache>,
    ) -> Self {
        // Accept the host with or without a scheme prefix.
        let host = config.watsonx_url.as_ref().map(|url| {
            url.trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_string()
        });

        Self {
            client: reqwest::Client::new(),
            api_key,
            project_id: config.watsonx_project_id.clone(),
            host,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            token_cache,
        }
    }

    /// Cache identity for this backend's credentials
    fn identity(&self) -> String {
        let key = self.api_key.as_deref().unwrap_or("");
        let mut cut = key.len().min(16);
        while !key.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("watsonx:{}", &key[..cut])
    }

    async fn bearer_token(&self, api_key: &str) -> ProviderResult<String> {
        let client = self.client.clone();
        let api_key = api_key.to_string();

        self.token_cache
            .get_or_refresh(&self.identity(), move || exchange_iam_token(client, api_key))
            .await
    }
}

/// Exchange a watsonx API key for an IAM bearer token
async fn exchange_iam_token(
    client: reqwest::Client,
    api_key: String,
) -> ProviderResult<CachedToken> {
    debug!("exchanging watsonx API key for IAM token");

    let response = client
        .post(IAM_URL)
        .form(&[
            ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
            ("apikey", api_key.as_str()),
        ])
        .send()
        .await
        .map_err(map_transport)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        // A rejected key exchange is an auth failure regardless of status.
        return Err(match map_status(status, &body) {
            ProviderError::Fatal(msg) => ProviderError::Auth(msg),
            other => other,
        });
    }

    #[derive(Deserialize)]
    struct IamResponse {
        access_token: String,
        #[serde(default = "default_expiry")]
        expires_in: u64,
    }

    fn default_expiry() -> u64 {
        3600
    }

    let parsed: IamResponse = response
        .json()
        .await
        .map_err(|e| ProviderError::Auth(format!("malformed IAM response: {}", e)))?;

    Ok(CachedToken {
        token: parsed.access_token,
        expires_at: Instant::now() + Duration::from_secs(parsed.expires_in),
    })
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    input: String,
    parameters: GenerationParameters,
    model_id: &'a str,
    project_id: &'a str,
}

#[derive(Serialize)]
struct GenerationParameters {
    decoding_method: &'static str,
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    repetition_penalty: f32,
}

#[derive(Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationResult>,
}

#[derive(Deserialize)]
struct GenerationResult {
    #[serde(default)]
    generated_text: String,
}

#[async_trait]
impl Provider for WatsonxProvider {
    fn name(&self) -> &'static str {
        "watsonx"
    }

    async fn complete(&self, system_prompt: &str, content: &str) -> ProviderResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::Auth("no API key configured for watsonx".to_string()))?;
        let project_id = self.project_id.as_deref().ok_or_else(|| {
            ProviderError::Fatal("watsonx_project_id is not configured".to_string())
        })?;
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| ProviderError::Fatal("watsonx_url is not configured".to_string()))?;

        let bearer = self.bearer_token(api_key).await?;

        // watsonx takes one flat prompt rather than role-tagged messages.
        let input = format!("System: {}\n\nHuman: {}", system_prompt, content);

        let body = GenerationRequest {
            input,
            parameters: GenerationParameters {
                decoding_method: "greedy",
                max_new_tokens: self.max_tokens,
                temperature: self.temperature,
                top_p: 0.9,
                repetition_penalty: 1.1,
            },
            model_id: &self.model,
            project_id,
        };

        debug!(model = %self.model, "sending generation request");

        let url = format!(
            "https://{}/ml/v1/text/generation?version={}",
            host, GENERATION_VERSION
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body));
        }

        let parsed: GenerationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Fatal(format!("malformed generation response: {}", e)))?;

        parsed
            .results
            .into_iter()
            .next()
            .map(|r| r.generated_text)
            .ok_or_else(|| ProviderError::Fatal("generation response had no results".to_string()))
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.project_id.is_some() && self.host.is_some()
    }

    async fn invalidate_credentials(&self) {
        self.token_cache.invalidate(&self.identity()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(url: Option<&str>, project: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            watsonx_url: url.map(str::to_string),
            watsonx_project_id: project.map(str::to_string),
            ..ProviderConfig::default()
        }
    }

    fn cache() -> Arc<TokenCache> {
        Arc::new(TokenCache::new(Duration::from_secs(600)))
    }

    #[test]
    fn test_host_scheme_stripped() {
        let config = config_with(Some("https://us-south.ml.cloud.ibm.com/"), Some("p"));
        let provider = WatsonxProvider::new(Some("wx".to_string()), &config, cache());
        assert_eq!(provider.host.as_deref(), Some("us-south.ml.cloud.ibm.com"));
        assert!(provider.is_configured());
    }

    #[test]
    fn test_unconfigured_without_project() {
        let config = config_with(Some("us-south.ml.cloud.ibm.com"), None);
        let provider = WatsonxProvider::new(Some("wx".to_string()), &config, cache());
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn test_missing_project_is_fatal() {
        let config = config_with(Some("us-south.ml.cloud.ibm.com"), None);
        let provider = WatsonxProvider::new(Some("wx".to_string()), &config, cache());
        let result = provider.complete("sys", "content").await;
        assert!(matches!(result, Err(ProviderError::Fatal(_))));
    }

    #[test]
    fn test_identity_uses_key_prefix() {
        let config = config_with(Some("host"), Some("p"));
        let provider = WatsonxProvider::new(
            Some("abcdefghijklmnopqrstuvwxyz".to_string()),
            &config,
            cache(),
        );
        assert_eq!(provider.identity(), "watsonx:abcdefghijklmnop");
    }

    #[test]
    fn test_identity_with_multibyte_key() {
        // Byte 16 falls inside a two-byte character; the prefix backs
        // up to the previous boundary instead of panicking.
        let config = config_with(Some("host"), Some("p"));
        let provider = WatsonxProvider::new(
            Some(format!("a{}", "é".repeat(8))),
            &config,
            cache(),
        );
        assert_eq!(provider.identity(), format!("watsonx:a{}", "é".repeat(7)));
    }
}
