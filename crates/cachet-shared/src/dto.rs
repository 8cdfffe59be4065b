//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Demo quota status returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoStatusResponse {
    pub allowed: bool,
    pub remaining: u32,
    pub limit: u32,
    pub reset_in_seconds: u64,
    /// Human-readable countdown, e.g. "5 h 30 min".
    pub reset_in: String,
    pub count: u32,
    pub scenarios_viewed: Vec<String>,
}

/// Health report including the cache backend in use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub cache: CacheHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHealth {
    /// "memory" or "networked"
    pub backend: String,
    pub available: bool,
}
