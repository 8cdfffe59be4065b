use crate::error::ConfigError;

/// Provider-wide cache settings, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    default_ttl_seconds: u64,
    key_prefix: String,
}

impl CacheConfig {
    pub fn new(default_ttl_seconds: u64, key_prefix: impl Into<String>) -> Result<Self, ConfigError> {
        if default_ttl_seconds == 0 {
            return Err(ConfigError::NonPositiveTtl);
        }

        Ok(Self {
            default_ttl_seconds,
            key_prefix: key_prefix.into(),
        })
    }

    pub fn default_ttl_seconds(&self) -> u64 {
        self.default_ttl_seconds
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Physical key for a logical key. An empty prefix leaves keys untouched.
    pub fn physical_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 3600,
            key_prefix: "cachet".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ttl_rejected() {
        assert_eq!(CacheConfig::new(0, "app"), Err(ConfigError::NonPositiveTtl));
    }

    #[test]
    fn test_physical_key() {
        let config = CacheConfig::new(60, "app").unwrap();
        assert_eq!(config.physical_key("user:1"), "app:user:1");

        let bare = CacheConfig::new(60, "").unwrap();
        assert_eq!(bare.physical_key("user:1"), "user:1");
    }
}
