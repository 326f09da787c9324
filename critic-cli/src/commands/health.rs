//! Health command - check provider configuration

use critic_core::{Config, Pipeline, Secrets};

/// Report whether the configured provider has what it needs
///
/// Exits nonzero when the provider is missing credentials so the check
/// can gate CI jobs.
pub fn health(config: &Config) -> anyhow::Result<()> {
    let secrets = Secrets::load()?;
    let pipeline = Pipeline::new(config.clone(), &secrets);
    let health = pipeline.health();

    if health.configured {
        println!("ok: provider {} is configured", health.provider);
        Ok(())
    } else {
        anyhow::bail!(
            "provider {} is not configured; check API keys in the environment \
             or the secrets file",
            health.provider
        )
    }
}
