//! Demo usage tracking - a per-client quota over a rolling window that
//! starts at the client's first demo run.

use std::sync::Arc;

use chrono::Utc;

use cachet_core::domain::keys::demo_usage_key;
use cachet_core::domain::{DemoLimitResult, DemoUsage, RateLimitConfig, RateLimitPreset};
use cachet_core::ports::KeyTtl;

use crate::cache::CacheProvider;

/// Tracks demo runs per client as one record that expires as a whole.
///
/// Read-modify-write of the record is not atomic: two simultaneous runs
/// from the same client can both read the old count.
pub struct DemoUsageTracker {
    cache: Arc<CacheProvider>,
    config: RateLimitConfig,
}

impl DemoUsageTracker {
    /// Tracker using the `demo` preset quota.
    pub fn new(cache: Arc<CacheProvider>) -> Self {
        Self::with_config(cache, RateLimitPreset::Demo.config())
    }

    pub fn with_config(cache: Arc<CacheProvider>, config: RateLimitConfig) -> Self {
        Self { cache, config }
    }

    pub fn limit(&self) -> u32 {
        self.config.limit()
    }

    pub async fn get_demo_usage(&self, client_key: &str) -> Option<DemoUsage> {
        self.cache.get(&demo_usage_key(client_key)).await
    }

    /// Report the client's quota without consuming any of it.
    pub async fn check_demo_limit(&self, client_key: &str) -> DemoLimitResult {
        let key = demo_usage_key(client_key);
        let usage: Option<DemoUsage> = self.cache.get(&key).await;

        let reset_in = match &usage {
            Some(usage) => self.remaining_window(&key, usage).await,
            None => 0,
        };

        DemoLimitResult::from_usage(self.config.limit(), usage, reset_in)
    }

    /// Count one demo run of `scenario_id` and report the updated quota.
    ///
    /// The run is always recorded; callers gate on [`Self::check_demo_limit`]
    /// first.
    pub async fn record_demo_usage(&self, client_key: &str, scenario_id: &str) -> DemoLimitResult {
        let key = demo_usage_key(client_key);

        let (usage, ttl) = match self.update_existing(&key, client_key, scenario_id).await {
            Some(usage) => {
                let ttl = self.remaining_window(&key, &usage).await;
                (usage, ttl)
            }
            None => {
                let usage = DemoUsage::first(scenario_id);
                let window = self.config.window_seconds();
                if let Err(e) = self.cache.set(&key, &usage, Some(window)).await {
                    tracing::warn!(client = %client_key, error = %e, "Failed to store demo usage");
                }
                (usage, window)
            }
        };

        tracing::debug!(
            client = %client_key,
            scenario = %scenario_id,
            count = usage.count,
            "Demo usage recorded"
        );

        DemoLimitResult::from_usage(self.config.limit(), Some(usage), ttl)
    }

    pub async fn reset_demo_usage(&self, client_key: &str) -> bool {
        self.cache.delete(&demo_usage_key(client_key)).await
    }

    /// Add a run to the stored record in place, keeping the expiry set at
    /// first use. `None` when there is no live record to update.
    async fn update_existing(
        &self,
        key: &str,
        client_key: &str,
        scenario_id: &str,
    ) -> Option<DemoUsage> {
        let mut usage: DemoUsage = self.cache.get(key).await?;
        usage.record(scenario_id);

        match self.cache.replace(key, &usage).await {
            Ok(true) => Some(usage),
            // Expired between the read and the write
            Ok(false) => None,
            Err(e) => {
                tracing::warn!(client = %client_key, error = %e, "Failed to store demo usage");
                Some(usage)
            }
        }
    }

    /// Seconds left in the window that began at the client's first run.
    ///
    /// Prefers the backend's TTL; falls back to the stored start time.
    async fn remaining_window(&self, key: &str, usage: &DemoUsage) -> u64 {
        if let KeyTtl::Expires(secs) = self.cache.ttl(key).await {
            if secs > 0 {
                return secs;
            }
        }

        let elapsed = (Utc::now() - usage.first_used_at).num_seconds().max(0) as u64;
        self.config.window_seconds().saturating_sub(elapsed).max(1)
    }
}
