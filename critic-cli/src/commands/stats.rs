//! Stats command - show the configured agents and provider

use clap::Args;
use critic_core::{Config, Pipeline, Secrets};

/// Arguments for the stats command
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Print the stats as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsArgs {
    /// Print pipeline facts: provider, model, agents, enums, file caps
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let secrets = Secrets::load()?;
        let pipeline = Pipeline::new(config.clone(), &secrets);
        let stats = pipeline.stats();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("Provider: {} ({})", stats.provider, stats.model);
        println!(
            "File caps: {} full, {} quick",
            stats.max_files_full, stats.max_files_quick
        );
        println!();
        println!("Agents:");
        for agent in &stats.agents {
            println!("  {:<12} {}", agent.name, agent.description);
        }
        println!();
        println!("Categories: {}", stats.categories.join(", "));
        println!("Severities: {}", stats.severities.join(", "));

        Ok(())
    }
}
