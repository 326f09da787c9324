//! Pull request retrieval seam
//!
//! The pipeline only needs raw diff text and a little metadata; where they
//! come from is behind [`DiffFetcher`] so the core stays independent of any
//! particular forge client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies a pull request to review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrReviewRequest {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PrReviewRequest {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    /// Identifier in the form `owner/repo#number`
    pub fn subject_id(&self) -> String {
        format!("{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Metadata about a pull request, attached to the review output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrMetadata {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    pub files_changed: usize,
    pub additions: usize,
    pub deletions: usize,
}

/// Error retrieving a pull request from the forge
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Pull request not found: {0}")]
    NotFound(String),

    #[error("Access forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limited by the forge API")]
    RateLimited,

    #[error("Fetch failed: {0}")]
    Other(String),
}

/// Source of pull request diffs and metadata
#[async_trait]
pub trait DiffFetcher: Send + Sync {
    /// Fetch the raw unified diff for a pull request
    async fn fetch_diff(&self, request: &PrReviewRequest) -> Result<String, FetchError>;

    /// Fetch pull request metadata
    async fn fetch_metadata(&self, request: &PrReviewRequest) -> Result<PrMetadata, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_id() {
        let request = PrReviewRequest::new("acme", "widgets", 42);
        assert_eq!(request.subject_id(), "acme/widgets#42");
    }
}
