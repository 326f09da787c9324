//! Critic CLI - automated code review for pull requests and diffs

mod commands;

use clap::{Parser, Subcommand};
use critic_core::config::ProviderKind;
use critic_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{DiffArgs, PrArgs, StatsArgs};

/// Critic: multi-agent code review for pull requests
#[derive(Parser, Debug)]
#[command(name = "critic")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Model backend to use (overrides config and env)
    #[arg(long, global = true, env = "CRITIC_PROVIDER")]
    provider: Option<ProviderKind>,

    /// Model to use (overrides config and env)
    #[arg(long, global = true, env = "CRITIC_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Review a GitHub pull request
    Pr(PrArgs),

    /// Review a diff from a file or stdin
    Diff(DiffArgs),

    /// Show the configured agents and provider
    Stats(StatsArgs),

    /// Check provider configuration
    Health,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = Config::load_with_overrides(cli.provider, cli.model.clone())?;

    if cli.verbose {
        tracing::info!(
            provider = %config.provider.kind,
            model = %config.provider.model,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Pr(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Diff(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Stats(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::Health) => {
            commands::health(&config)?;
        }
        Some(Commands::Config) => {
            println!("Critic Configuration");
            println!("====================");
            println!();
            println!("Provider:");
            println!("  kind: {}", config.provider.kind);
            println!("  model: {}", config.provider.model);
            println!();
            println!("Review:");
            println!("  max_files_full: {}", config.review.max_files_full);
            println!("  max_files_quick: {}", config.review.max_files_quick);
            println!("  max_concurrency: {}", config.review.max_concurrency);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("Critic - automated code review for pull requests");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
