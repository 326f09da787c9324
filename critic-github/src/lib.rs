//! GitHub integration for critic
//!
//! Implements the core crate's [`critic_core::DiffFetcher`] seam on top
//! of the GitHub REST API.

mod client;

pub use client::GitHubClient;
