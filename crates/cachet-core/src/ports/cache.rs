use std::fmt;

use async_trait::async_trait;

/// Longest expiry a backend honours. Redis rejects expiries whose
/// millisecond form overflows an `i64`; longer TTLs are stored without one.
pub const MAX_TTL_SECONDS: u64 = (i64::MAX / 1000) as u64;

/// Remaining lifetime of a stored key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key exists and expires after this many seconds.
    Expires(u64),
    /// Key exists without an expiry.
    Persistent,
    /// Key does not exist (or has already expired).
    Missing,
}

impl KeyTtl {
    /// Numeric form: seconds remaining, `-1` for no expiry, `-2` for a missing key.
    pub fn as_seconds(self) -> i64 {
        match self {
            KeyTtl::Expires(secs) => secs as i64,
            KeyTtl::Persistent => -1,
            KeyTtl::Missing => -2,
        }
    }

    /// Inverse of [`KeyTtl::as_seconds`], matching the Redis `TTL` reply.
    pub fn from_seconds(secs: i64) -> Self {
        match secs {
            -1 => KeyTtl::Persistent,
            s if s < 0 => KeyTtl::Missing,
            s => KeyTtl::Expires(s as u64),
        }
    }
}

/// Which storage backend a provider dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Networked,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Networked => "networked",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache store trait - abstraction over storage backends (Redis, in-memory).
///
/// Keys are physical keys (already prefixed) and values are opaque text.
/// Implementations never return errors from these operations: a failing
/// backend logs and answers with the negative result (`None`, `false`, `0`).
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value, `None` on miss or expiry.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value, replacing any previous value and expiry.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64);

    /// Overwrite the value of an existing key, keeping its expiry.
    /// Returns false (and stores nothing) when the key is missing.
    async fn replace(&self, key: &str, value: &str) -> bool;

    /// Check if a key is present and not expired.
    async fn exists(&self, key: &str) -> bool;

    /// Delete a key. Returns true if it existed.
    async fn delete(&self, key: &str) -> bool;

    /// Delete every key matching a glob where only `*` is a wildcard.
    async fn delete_pattern(&self, pattern: &str) -> u64;

    /// Atomically increment an integer counter, creating it at 0 first.
    async fn incr(&self, key: &str) -> i64;

    /// Remaining lifetime of a key.
    async fn ttl(&self, key: &str) -> KeyTtl;

    /// Set or replace the expiry of an existing key. A zero expiry removes it;
    /// anything above [`MAX_TTL_SECONDS`] makes it persistent.
    async fn expire(&self, key: &str, seconds: u64) -> bool;

    /// Whether the backend answered its connectivity probe.
    fn is_available(&self) -> bool;

    fn kind(&self) -> BackendKind;
}

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_numeric_contract() {
        assert_eq!(KeyTtl::Expires(30).as_seconds(), 30);
        assert_eq!(KeyTtl::Persistent.as_seconds(), -1);
        assert_eq!(KeyTtl::Missing.as_seconds(), -2);

        assert_eq!(KeyTtl::from_seconds(-2), KeyTtl::Missing);
        assert_eq!(KeyTtl::from_seconds(-1), KeyTtl::Persistent);
        assert_eq!(KeyTtl::from_seconds(0), KeyTtl::Expires(0));
    }

    #[test]
    fn test_backend_kind_names() {
        assert_eq!(BackendKind::Memory.as_str(), "memory");
        assert_eq!(BackendKind::Networked.to_string(), "networked");
    }
}
