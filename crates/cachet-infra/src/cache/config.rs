//! Networked backend configuration.

use std::time::Duration;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Credential, overrides any password embedded in the URL
    pub password: Option<String>,
    /// Connection and probe timeout
    pub connect_timeout: Duration,
    /// Per-operation timeout; a slower reply counts as a failure
    pub op_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            password: None,
            connect_timeout: Duration::from_secs(5),
            op_timeout: Duration::from_millis(2000),
        }
    }
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `None` when `REDIS_URL` is unset or empty, meaning no
    /// networked backend is configured.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("REDIS_URL").ok().filter(|u| !u.trim().is_empty())?;

        Some(Self {
            url,
            password: std::env::var("REDIS_PASSWORD")
                .or_else(|_| std::env::var("REDIS_TOKEN"))
                .ok()
                .filter(|p| !p.is_empty()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            op_timeout: Duration::from_millis(
                std::env::var("REDIS_OP_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
        })
    }
}
