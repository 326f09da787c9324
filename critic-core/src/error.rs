//! Error types for the critic core

use thiserror::Error;

use crate::fetch::FetchError;
use crate::provider::ProviderError;

/// Result type alias for critic operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for critic operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Diff text contained no recognizable structure
    #[error("Diff parse error: {0}")]
    Parse(String),

    /// The external collaborator could not retrieve the pull request
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A provider call failed outside of the per-pair dispatch path
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Every (file, agent) pair failed during dispatch
    #[error("Review failed: {0}")]
    ReviewFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
