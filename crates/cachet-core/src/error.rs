//! Domain-level error types.

use thiserror::Error;

/// Configuration errors - rejected when a config value is constructed,
/// never when it is used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Default TTL must be positive")]
    NonPositiveTtl,

    #[error("Rate limit for '{identifier}' must be positive")]
    NonPositiveLimit { identifier: String },

    #[error("Rate limit window for '{identifier}' must be positive")]
    NonPositiveWindow { identifier: String },

    #[error("Rate limit identifier must not be empty")]
    EmptyIdentifier,

    #[error("Cache capacity must be positive")]
    ZeroCapacity,
}
