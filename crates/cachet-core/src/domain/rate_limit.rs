use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed-window rate limit definition.
///
/// The same `(identifier, client)` pair always maps to the same counter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    identifier: String,
    limit: u32,
    window_seconds: u64,
}

impl RateLimitConfig {
    pub fn new(
        identifier: impl Into<String>,
        limit: u32,
        window_seconds: u64,
    ) -> Result<Self, ConfigError> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(ConfigError::EmptyIdentifier);
        }
        if limit == 0 {
            return Err(ConfigError::NonPositiveLimit { identifier });
        }
        if window_seconds == 0 {
            return Err(ConfigError::NonPositiveWindow { identifier });
        }

        Ok(Self {
            identifier,
            limit,
            window_seconds,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window_seconds(&self) -> u64 {
        self.window_seconds
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

/// Named presets shared by every collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitPreset {
    Api,
    Demo,
    Chat,
    Analysis,
}

impl RateLimitPreset {
    pub const ALL: [RateLimitPreset; 4] = [
        RateLimitPreset::Api,
        RateLimitPreset::Demo,
        RateLimitPreset::Chat,
        RateLimitPreset::Analysis,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RateLimitPreset::Api => "api",
            RateLimitPreset::Demo => "demo",
            RateLimitPreset::Chat => "chat",
            RateLimitPreset::Analysis => "analysis",
        }
    }

    /// `(limit, window_seconds)` for the preset.
    pub fn quota(self) -> (u32, u64) {
        match self {
            RateLimitPreset::Api => (30, 60),
            RateLimitPreset::Demo => (3, 86_400),
            RateLimitPreset::Chat => (10, 60),
            RateLimitPreset::Analysis => (5, 60),
        }
    }

    pub fn config(self) -> RateLimitConfig {
        let (limit, window_seconds) = self.quota();
        // Preset quotas are all non-zero, so this never goes through validation.
        RateLimitConfig {
            identifier: self.as_str().to_string(),
            limit,
            window_seconds,
        }
    }
}

impl fmt::Display for RateLimitPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateLimitPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RateLimitPreset::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown rate limit preset: {s}"))
    }
}

/// Result of a rate limit check. Computed on every call, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub limit: u32,
    pub reset_in_seconds: u64,
}

impl RateLimitResult {
    /// Build a result from the counter value seen after this call's increment.
    ///
    /// A count of 0 means the backend could not count the request; it is
    /// reported as allowed with the full quota remaining.
    pub fn from_count(limit: u32, count: i64, reset_in_seconds: u64) -> Self {
        let count = count.max(0);
        let allowed = count <= i64::from(limit);
        let remaining = (i64::from(limit) - count).max(0) as u32;

        Self {
            allowed,
            remaining,
            limit,
            reset_in_seconds,
        }
    }

    pub fn reset_after(&self) -> Duration {
        Duration::from_secs(self.reset_in_seconds)
    }
}
