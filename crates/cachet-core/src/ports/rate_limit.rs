//! Rate limiting port.

use async_trait::async_trait;

use crate::domain::{RateLimitConfig, RateLimitResult};

/// Rate limiter trait - abstraction over rate limiting strategies.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request for `client_key` against `config` and report the
    /// resulting quota. Checking always consumes one unit.
    async fn check(&self, config: &RateLimitConfig, client_key: &str) -> RateLimitResult;
}
