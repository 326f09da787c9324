//! End-to-end review pipeline
//!
//! Ties parsing, orchestration, and aggregation together behind two entry
//! points: [`Pipeline::review_diff`] for raw diff text and
//! [`Pipeline::review_pr`] for a pull request behind a [`DiffFetcher`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, instrument};

use crate::agent::AgentKind;
use crate::config::Config;
use crate::diff::{self, FileChange};
use crate::fetch::{DiffFetcher, PrReviewRequest};
use crate::provider::{build_provider, Provider, TokenCache};
use crate::review::aggregate::{aggregate, summarize};
use crate::review::orchestrator::{Orchestrator, ReviewMode};
use crate::review::{Review, ReviewStage};
use crate::secrets::Secrets;
use crate::Result;

/// Tokens obtained by exchange are refreshed this long before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(600);

/// Description of one agent, reported by [`Pipeline::stats`]
#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
}

/// Static pipeline facts for introspection
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub provider: &'static str,
    pub model: String,
    pub agents: Vec<AgentInfo>,
    pub categories: Vec<&'static str>,
    pub severities: Vec<&'static str>,
    pub max_files_full: usize,
    pub max_files_quick: usize,
}

/// Result of a configuration health check
#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub provider: &'static str,
    pub configured: bool,
}

/// The review pipeline façade
pub struct Pipeline {
    config: Config,
    provider: Arc<dyn Provider>,
    orchestrator: Orchestrator,
}

impl Pipeline {
    /// Build a pipeline from configuration and secrets
    pub fn new(config: Config, secrets: &Secrets) -> Self {
        let token_cache = Arc::new(TokenCache::new(TOKEN_REFRESH_MARGIN));
        let provider: Arc<dyn Provider> =
            Arc::from(build_provider(&config.provider, secrets, token_cache));
        Self::with_provider(config, provider)
    }

    /// Build a pipeline around an existing provider
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Self {
        let orchestrator = Orchestrator::new(
            Arc::clone(&provider),
            config.retry.clone(),
            config.review.clone(),
        );
        Self {
            config,
            provider,
            orchestrator,
        }
    }

    /// Review raw unified diff text
    ///
    /// With `file_path` set, hunks-only input is accepted and attributed
    /// to that path.
    #[instrument(skip(self, diff_text), fields(stage = %ReviewStage::Received))]
    pub async fn review_diff(
        &self,
        diff_text: &str,
        file_path: Option<&str>,
        mode: ReviewMode,
    ) -> Result<Review> {
        let files = match file_path {
            Some(path) => diff::parse_single(diff_text, path)?,
            None => diff::parse(diff_text)?,
        };
        self.review_files(files, "diff".to_string(), serde_json::Map::new(), mode)
            .await
    }

    /// Review a pull request
    ///
    /// Metadata is attached to the review; a pull request whose diff
    /// touches no reviewable files yields an empty review rather than
    /// an error.
    #[instrument(skip(self, fetcher), fields(subject = %request.subject_id()))]
    pub async fn review_pr(
        &self,
        fetcher: &dyn DiffFetcher,
        request: &PrReviewRequest,
        mode: ReviewMode,
    ) -> Result<Review> {
        let metadata = fetcher.fetch_metadata(request).await?;
        let diff_text = fetcher.fetch_diff(request).await?;

        let mut meta = serde_json::Map::new();
        meta.insert("title".to_string(), metadata.title.clone().into());
        meta.insert("author".to_string(), metadata.author.clone().into());
        if let Some(description) = &metadata.description {
            meta.insert("description".to_string(), description.clone().into());
        }
        meta.insert("additions".to_string(), metadata.additions.into());
        meta.insert("deletions".to_string(), metadata.deletions.into());

        if diff_text.trim().is_empty() {
            info!(subject = %request.subject_id(), "pull request has an empty diff");
            return Ok(Review {
                subject_id: request.subject_id(),
                total_files_changed: 0,
                total_comments: 0,
                comments: Vec::new(),
                summary: "No issues found.".to_string(),
                partial: false,
                metadata: meta,
            });
        }

        let files = diff::parse(&diff_text)?;
        self.review_files(files, request.subject_id(), meta, mode)
            .await
    }

    async fn review_files(
        &self,
        files: Vec<FileChange>,
        subject_id: String,
        mut metadata: serde_json::Map<String, serde_json::Value>,
        mode: ReviewMode,
    ) -> Result<Review> {
        let total_files_changed = files.len();
        let selected = self.orchestrator.select_files(&files, mode);
        info!(
            subject = %subject_id,
            total_files = total_files_changed,
            selected = selected.len(),
            stage = %ReviewStage::Dispatching,
            "starting review"
        );

        let outcome = self.orchestrator.dispatch(&selected, mode).await?;
        let partial = outcome.is_partial();
        if outcome.truncated {
            metadata.insert("diff_truncated".to_string(), true.into());
        }

        let comments = aggregate(outcome.comments, self.config.review.dedup_line_tolerance);
        let summary = summarize(&comments);
        info!(
            subject = %subject_id,
            comments = comments.len(),
            partial,
            stage = %ReviewStage::Completed,
            "review complete"
        );

        Ok(Review {
            subject_id,
            total_files_changed,
            total_comments: comments.len(),
            comments,
            summary,
            partial,
            metadata,
        })
    }

    /// Static facts about the pipeline's agents and provider
    pub fn stats(&self) -> Stats {
        Stats {
            provider: self.provider.name(),
            model: self.config.provider.model.clone(),
            agents: AgentKind::all()
                .iter()
                .map(|agent| AgentInfo {
                    name: agent.name(),
                    category: agent.category().name(),
                    description: agent.description(),
                })
                .collect(),
            categories: crate::review::Category::all()
                .iter()
                .map(|c| c.name())
                .collect(),
            severities: crate::review::Severity::all()
                .iter()
                .map(|s| s.name())
                .collect(),
            max_files_full: self.config.review.max_files_full,
            max_files_quick: self.config.review.max_files_quick,
        }
    }

    /// Check provider configuration without making a model call
    pub fn health(&self) -> Health {
        Health {
            provider: self.provider.name(),
            configured: self.provider.is_configured(),
        }
    }
}
