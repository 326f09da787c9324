//! Retry loop with exponential backoff and jitter for provider calls

use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::config::RetryConfig;

use super::{Provider, ProviderError, ProviderResult};

/// Call a provider with the configured retry policy
///
/// Rate limits and timeouts are retried with exponential backoff and
/// jitter up to `max_attempts`; an auth failure triggers one forced
/// credential invalidation and at most one retry; fatal errors surface
/// immediately. A timeout that exhausts the attempt budget surfaces as
/// fatal.
pub async fn call_with_retry(
    provider: &dyn Provider,
    policy: &RetryConfig,
    system_prompt: &str,
    content: &str,
) -> ProviderResult<String> {
    let mut auth_retried = false;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let call = provider.complete(system_prompt, content);
        let result = match tokio::time::timeout(policy.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        };

        match result {
            Ok(text) => return Ok(text),
            Err(err) if err.is_retryable() => {
                if attempt >= policy.max_attempts {
                    return Err(match err {
                        ProviderError::Timeout => ProviderError::Fatal(format!(
                            "call timed out after {} attempts",
                            attempt
                        )),
                        other => other,
                    });
                }
                let delay = backoff_delay(policy, attempt);
                warn!(
                    provider = provider.name(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    kind = err.kind(),
                    "provider call failed, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(ProviderError::Auth(msg)) => {
                if auth_retried {
                    return Err(ProviderError::Auth(msg));
                }
                warn!(
                    provider = provider.name(),
                    "auth failure, forcing credential refresh"
                );
                auth_retried = true;
                provider.invalidate_credentials().await;
            }
            Err(fatal) => return Err(fatal),
        }
    }
}

/// Exponential backoff for the given attempt number with up to 25% jitter
fn backoff_delay(policy: &RetryConfig, attempt: u32) -> Duration {
    let exp = policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
    let capped = exp.min(policy.max_delay);
    let jitter = rand::thread_rng().gen_range(0.0..0.25);
    capped.mul_f64(1.0 + jitter)
}
