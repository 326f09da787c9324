//! Pr command - review a GitHub pull request

use clap::Args;
use critic_core::{Config, Pipeline, PrReviewRequest, ReviewMode, Secrets};
use critic_github::GitHubClient;

use super::render::print_review;

/// Arguments for the pr command
#[derive(Args, Debug)]
pub struct PrArgs {
    /// Repository in owner/repo form
    #[arg(required = true)]
    pub repo: String,

    /// Pull request number
    #[arg(required = true)]
    pub number: u64,

    /// Quick review: logic and security agents only, fewer files
    #[arg(short, long)]
    pub quick: bool,

    /// GitHub token (overrides GITHUB_TOKEN and the secrets file)
    #[arg(long)]
    pub token: Option<String>,

    /// Print the review as JSON
    #[arg(long)]
    pub json: bool,
}

impl PrArgs {
    /// Execute the pr command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let (owner, repo) = self
            .repo
            .split_once('/')
            .ok_or_else(|| anyhow::anyhow!("Expected owner/repo, got: {}", self.repo))?;

        let secrets = Secrets::load()?;
        let token = self.token.clone().or_else(|| secrets.github_token());
        let fetcher = GitHubClient::new(token)?;
        let pipeline = Pipeline::new(config.clone(), &secrets);

        let request = PrReviewRequest::new(owner, repo, self.number);
        let mode = if self.quick {
            ReviewMode::Quick
        } else {
            ReviewMode::Full
        };

        let review = pipeline.review_pr(&fetcher, &request, mode).await?;
        print_review(&review, self.json)
    }
}
