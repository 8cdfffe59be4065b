//! Fixed-window rate limiter on top of the cache provider.

use std::sync::Arc;

use async_trait::async_trait;

use cachet_core::domain::keys::rate_limit_key;
use cachet_core::domain::{RateLimitConfig, RateLimitPreset, RateLimitResult};
use cachet_core::ports::{KeyTtl, RateLimiter};

use crate::cache::CacheProvider;

/// Counts requests per `(identifier, client)` in fixed windows.
///
/// The first increment of a window sets its expiry; later increments leave
/// it alone, so the window closes `window_seconds` after its first request.
/// When the backend cannot count (it answers `incr` with 0) the request is
/// allowed: availability wins over strict enforcement during an outage.
pub struct FixedWindowRateLimiter {
    cache: Arc<CacheProvider>,
}

impl FixedWindowRateLimiter {
    pub fn new(cache: Arc<CacheProvider>) -> Self {
        Self { cache }
    }

    /// Consume one unit of `config` for `client_key`.
    pub async fn check_rate_limit(
        &self,
        config: &RateLimitConfig,
        client_key: &str,
    ) -> RateLimitResult {
        let key = rate_limit_key(config.identifier(), client_key);
        let window = config.window_seconds();

        let count = self.cache.incr(&key).await;
        if count == 0 {
            // Nothing was counted; skip the remaining round trips.
            tracing::warn!(key = %key, "Rate limit counter unavailable, allowing request");
            return RateLimitResult::from_count(config.limit(), 0, window);
        }
        if count == 1 {
            self.cache.expire(&key, window).await;
        }

        let reset_in_seconds = match self.cache.ttl(&key).await {
            KeyTtl::Expires(secs) => secs,
            KeyTtl::Persistent => {
                // The expire after the first increment never landed.
                tracing::warn!(key = %key, "Rate limit counter without expiry, restoring window");
                self.cache.expire(&key, window).await;
                window
            }
            KeyTtl::Missing => window,
        };

        let result = RateLimitResult::from_count(config.limit(), count, reset_in_seconds);
        if !result.allowed {
            tracing::debug!(
                identifier = %config.identifier(),
                client = %client_key,
                count,
                reset_in_seconds,
                "Rate limit exceeded"
            );
        }
        result
    }

    /// Consume one unit of a named preset.
    pub async fn check_preset(&self, preset: RateLimitPreset, client_key: &str) -> RateLimitResult {
        self.check_rate_limit(&preset.config(), client_key).await
    }

    /// Drop the counter for `client_key`, starting a fresh window.
    pub async fn reset(&self, config: &RateLimitConfig, client_key: &str) -> bool {
        self.cache
            .delete(&rate_limit_key(config.identifier(), client_key))
            .await
    }
}

#[async_trait]
impl RateLimiter for FixedWindowRateLimiter {
    async fn check(&self, config: &RateLimitConfig, client_key: &str) -> RateLimitResult {
        self.check_rate_limit(config, client_key).await
    }
}
