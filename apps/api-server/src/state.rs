//! Application state - shared across all handlers.

use std::sync::Arc;

use cachet_core::ports::RateLimiter;
use cachet_infra::{CacheProvider, DemoUsageTracker, FixedWindowRateLimiter};

use crate::config::AppConfig;

/// Shared application state.
///
/// The cache provider is built once here and handed to every consumer.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheProvider>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub demo: Arc<DemoUsageTracker>,
}

impl AppState {
    /// Build the application state, connecting to Redis when configured.
    pub async fn new(config: &AppConfig) -> Self {
        let cache = Arc::new(CacheProvider::connect(config.cache.clone(), config.redis.clone()).await);
        Self::with_cache(cache)
    }

    pub fn with_cache(cache: Arc<CacheProvider>) -> Self {
        let rate_limiter: Arc<dyn RateLimiter> =
            Arc::new(FixedWindowRateLimiter::new(cache.clone()));
        let demo = Arc::new(DemoUsageTracker::new(cache.clone()));

        tracing::info!(
            backend = %cache.backend_type(),
            available = cache.is_available(),
            "Application state initialized"
        );

        Self {
            cache,
            rate_limiter,
            demo,
        }
    }
}
