//! Domain types - configuration, quota results and the key namespace.

mod cache_config;
mod demo;
pub mod keys;
mod rate_limit;

pub use cache_config::CacheConfig;
pub use demo::{DemoLimitResult, DemoUsage, format_reset_time};
pub use rate_limit::{RateLimitConfig, RateLimitPreset, RateLimitResult};
