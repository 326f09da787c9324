//! Process-wide cache for exchanged, expiring bearer credentials
//!
//! One entry per backend identity. Refreshes are single-flighted: when
//! several callers observe a stale or absent token at once, exactly one
//! network exchange runs and every waiter receives its result.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::future::{FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::debug;

use super::{ProviderError, ProviderResult};

/// A bearer token with its expiry time
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub token: String,
    pub expires_at: Instant,
}

type RefreshFuture =
    Shared<Pin<Box<dyn Future<Output = std::result::Result<CachedToken, ProviderError>> + Send>>>;

enum Slot {
    Ready(CachedToken),
    Pending(RefreshFuture),
}

/// Per-identity credential cache with single-flight refresh
///
/// Created once at process start and shared via `Arc`; this is the only
/// state shared across concurrent requests.
pub struct TokenCache {
    margin: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

impl TokenCache {
    /// Create a cache that refreshes tokens `margin` ahead of expiry
    pub fn new(margin: Duration) -> Self {
        Self {
            margin,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Get a fresh token for `identity`, refreshing through `refresh`
    /// if the cached one is absent or within the safety margin of expiry
    pub async fn get_or_refresh<F, Fut>(
        &self,
        identity: &str,
        refresh: F,
    ) -> ProviderResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProviderResult<CachedToken>> + Send + 'static,
    {
        let shared = {
            let mut slots = self.slots.lock().await;
            match slots.get(identity) {
                Some(Slot::Ready(cached)) if self.is_fresh(cached) => {
                    return Ok(cached.token.clone());
                }
                Some(Slot::Pending(shared)) => shared.clone(),
                _ => {
                    debug!(identity, "credential stale or absent, starting refresh");
                    let fut: Pin<
                        Box<dyn Future<Output = ProviderResult<CachedToken>> + Send>,
                    > = Box::pin(refresh());
                    let shared = fut.shared();
                    slots.insert(identity.to_string(), Slot::Pending(shared.clone()));
                    shared
                }
            }
        };

        // Lock is released while the exchange runs; every waiter awaits
        // the same shared future and observes the same outcome.
        let result = shared.await;

        let mut slots = self.slots.lock().await;
        match result {
            Ok(cached) => {
                slots.insert(identity.to_string(), Slot::Ready(cached.clone()));
                Ok(cached.token)
            }
            Err(err) => {
                // Clear the failed flight so the next caller can retry.
                if matches!(slots.get(identity), Some(Slot::Pending(_))) {
                    slots.remove(identity);
                }
                Err(err)
            }
        }
    }

    /// Drop the entry for `identity` so the next call re-exchanges
    pub async fn invalidate(&self, identity: &str) {
        self.slots.lock().await.remove(identity);
    }

    fn is_fresh(&self, cached: &CachedToken) -> bool {
        cached.expires_at.saturating_duration_since(Instant::now()) > self.margin
    }
}
