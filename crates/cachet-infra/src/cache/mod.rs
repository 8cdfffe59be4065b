//! Cache implementations - Redis and in-memory fallback behind one provider.

mod bounded;
mod config;
mod memory;
mod pattern;
mod provider;

pub use bounded::{BoundedCache, BoundedCacheStats};
pub use config::RedisConfig;
pub use memory::InMemoryStore;
pub use provider::{Backend, CacheProvider};

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;
