//! # Cachet Infrastructure
//!
//! Concrete implementations of the ports defined in `cachet-core`: the
//! in-memory and Redis cache stores, the provider facade that picks one of
//! them at startup, and the rate limiter and demo tracker built on top.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `redis` - Redis backend for the cache provider

pub mod cache;
pub mod demo;
pub mod rate_limit;

// Re-exports - In-Memory
pub use cache::{Backend, BoundedCache, CacheProvider, InMemoryStore, RedisConfig};
pub use demo::DemoUsageTracker;
pub use rate_limit::FixedWindowRateLimiter;

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::RedisStore;
