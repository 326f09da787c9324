//! GitHub API client using octocrab
//!
//! Metadata comes through octocrab's typed pulls API. The raw diff is a
//! media-type variant of the pull request resource that octocrab does not
//! expose, so it is fetched directly with the v3.diff Accept header.

use async_trait::async_trait;
use critic_core::{DiffFetcher, FetchError, PrMetadata, PrReviewRequest};
use octocrab::Octocrab;
use tracing::{debug, info};

const API_BASE: &str = "https://api.github.com";
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";
const USER_AGENT: &str = concat!("critic/", env!("CARGO_PKG_VERSION"));

/// GitHub client serving pull request diffs and metadata
pub struct GitHubClient {
    client: Octocrab,
    http: reqwest::Client,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client, authenticated when a token is given
    ///
    /// Public repositories work without a token at a much lower rate
    /// limit.
    pub fn new(token: Option<String>) -> Result<Self, FetchError> {
        let mut builder = Octocrab::builder();
        if let Some(token) = &token {
            builder = builder.personal_token(token.clone());
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Other(format!("Failed to create GitHub client: {}", e)))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Other(format!("Failed to create HTTP client: {}", e)))?;

        info!(authenticated = token.is_some(), "Created GitHub client");

        Ok(Self {
            client,
            http,
            token,
        })
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DiffFetcher for GitHubClient {
    async fn fetch_diff(&self, request: &PrReviewRequest) -> Result<String, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            API_BASE, request.owner, request.repo, request.number
        );
        debug!(subject = %request.subject_id(), "Fetching raw diff");

        let mut req = self.http.get(&url).header("Accept", DIFF_MEDIA_TYPE);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| FetchError::Other(format!("Diff request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status(status, request));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Other(format!("Failed to read diff body: {}", e)))
    }

    async fn fetch_metadata(&self, request: &PrReviewRequest) -> Result<PrMetadata, FetchError> {
        debug!(subject = %request.subject_id(), "Fetching pull request metadata");

        let pr = self
            .client
            .pulls(&request.owner, &request.repo)
            .get(request.number)
            .await
            .map_err(|e| map_octocrab_error(e, request))?;

        Ok(PrMetadata {
            title: pr.title.unwrap_or_default(),
            author: pr.user.map(|u| u.login).unwrap_or_default(),
            description: pr.body.filter(|b| !b.is_empty()),
            files_changed: pr.changed_files.unwrap_or(0) as usize,
            additions: pr.additions.unwrap_or(0) as usize,
            deletions: pr.deletions.unwrap_or(0) as usize,
        })
    }
}

fn map_status(status: reqwest::StatusCode, request: &PrReviewRequest) -> FetchError {
    match status.as_u16() {
        404 => FetchError::NotFound(request.subject_id()),
        401 | 403 => FetchError::Forbidden(request.subject_id()),
        429 => FetchError::RateLimited,
        code => FetchError::Other(format!(
            "GitHub returned HTTP {} for {}",
            code,
            request.subject_id()
        )),
    }
}

fn map_octocrab_error(error: octocrab::Error, request: &PrReviewRequest) -> FetchError {
    match &error {
        octocrab::Error::GitHub { source, .. } => match source.status_code.as_u16() {
            404 => FetchError::NotFound(request.subject_id()),
            401 | 403 => FetchError::Forbidden(request.subject_id()),
            429 => FetchError::RateLimited,
            _ => FetchError::Other(error.to_string()),
        },
        _ => FetchError::Other(error.to_string()),
    }
}
