//! Diff command - review a unified diff from a file or stdin

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use critic_core::{Config, Pipeline, ReviewMode, Secrets};

use super::render::print_review;

/// Arguments for the diff command
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Diff file to review; reads stdin when omitted or "-"
    pub input: Option<PathBuf>,

    /// Attribute hunks-only input to this file path
    #[arg(short = 'f', long)]
    pub file_path: Option<String>,

    /// Quick review: logic and security agents only, fewer files
    #[arg(short, long)]
    pub quick: bool,

    /// Print the review as JSON
    #[arg(long)]
    pub json: bool,
}

impl DiffArgs {
    /// Execute the diff command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let diff_text = match &self.input {
            Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)?,
            _ => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            }
        };

        if diff_text.trim().is_empty() {
            anyhow::bail!("No diff input provided");
        }

        let secrets = Secrets::load()?;
        let pipeline = Pipeline::new(config.clone(), &secrets);
        let mode = if self.quick {
            ReviewMode::Quick
        } else {
            ReviewMode::Full
        };

        let review = pipeline
            .review_diff(&diff_text, self.file_path.as_deref(), mode)
            .await?;
        print_review(&review, self.json)
    }
}
