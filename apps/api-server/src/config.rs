//! Application configuration loaded from environment variables.

use std::env;

use cachet_core::ConfigError;
use cachet_core::domain::CacheConfig;
use cachet_infra::RedisConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cache: CacheConfig,
    /// Present only when `REDIS_URL` is set.
    pub redis: Option<RedisConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Fails when the cache settings are invalid (e.g. a zero default TTL).
    pub fn from_env() -> Result<Self, ConfigError> {
        let cache = CacheConfig::new(
            env::var("CACHE_DEFAULT_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
            env::var("CACHE_KEY_PREFIX").unwrap_or_else(|_| "cachet".to_string()),
        )?;

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            cache,
            redis: RedisConfig::from_env(),
        })
    }
}
