//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod cache;
mod rate_limit;

pub use cache::{BackendKind, CacheError, CacheStore, KeyTtl, MAX_TTL_SECONDS};
pub use rate_limit::RateLimiter;
