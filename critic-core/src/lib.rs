//! Core library for critic, an automated pull request reviewer
//!
//! A unified diff goes in; a structured, deduplicated review comes out.
//! The pieces:
//!
//! - [`diff`]: unified diff parsing into files, hunks, and lines
//! - [`agent`]: specialist review agents and response parsing
//! - [`provider`]: interchangeable model backends with retry and
//!   credential caching
//! - [`review`]: orchestration, aggregation, and the [`review::Pipeline`]
//!   façade
//! - [`fetch`]: the pull request retrieval seam implemented by forge
//!   clients

pub mod agent;
pub mod config;
pub mod diff;
pub mod error;
pub mod fetch;
pub mod provider;
pub mod review;
pub mod secrets;

pub use config::Config;
pub use error::{Error, Result};
pub use fetch::{DiffFetcher, FetchError, PrMetadata, PrReviewRequest};
pub use review::{Pipeline, Review, ReviewComment, ReviewMode};
pub use secrets::Secrets;
