//! Cache provider - the single entry point every consumer goes through.
//!
//! The provider owns the backend, applies the key prefix, serializes values
//! as JSON and offers `get_or_set` memoization on top of the raw store.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use cachet_core::domain::CacheConfig;
use cachet_core::ports::{BackendKind, CacheError, CacheStore, KeyTtl};

use super::config::RedisConfig;
use super::memory::InMemoryStore;
#[cfg(feature = "redis")]
use super::redis::RedisStore;

/// Storage backend chosen once at startup.
pub enum Backend {
    /// Process-local store.
    Memory(InMemoryStore),
    /// Shared store reachable over the network.
    #[cfg(feature = "redis")]
    Networked(RedisStore),
}

impl Backend {
    /// Pick a backend: Redis when configured and answering its probe,
    /// in-memory otherwise. Falling back is logged, never an error.
    pub async fn select(redis: Option<RedisConfig>) -> Self {
        let Some(config) = redis else {
            tracing::info!("REDIS_URL not set. Using in-memory cache backend.");
            return Backend::Memory(InMemoryStore::new());
        };

        Self::connect_networked(config).await
    }

    #[cfg(feature = "redis")]
    async fn connect_networked(config: RedisConfig) -> Self {
        let url = config.url.clone();
        match RedisStore::connect(config).await {
            Ok(store) => {
                tracing::info!(url = %url, "Using Redis cache backend");
                Backend::Networked(store)
            }
            Err(e) => {
                tracing::warn!(
                    url = %url,
                    error = %e,
                    "Redis unreachable. Falling back to in-memory cache backend."
                );
                Backend::Memory(InMemoryStore::new())
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn connect_networked(config: RedisConfig) -> Self {
        tracing::warn!(
            url = %config.url,
            "Redis configured but the redis feature is disabled. Using in-memory cache backend."
        );
        Backend::Memory(InMemoryStore::new())
    }

    fn store(&self) -> &dyn CacheStore {
        match self {
            Backend::Memory(store) => store,
            #[cfg(feature = "redis")]
            Backend::Networked(store) => store,
        }
    }
}

/// Unified cache facade over the selected [`Backend`].
///
/// Construct it once and share it through an `Arc`; the rate limiter and
/// demo tracker are built on top of it.
pub struct CacheProvider {
    backend: Backend,
    config: CacheConfig,
    /// Per-key locks for in-flight `get_or_set` computations.
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheProvider {
    pub fn new(backend: Backend, config: CacheConfig) -> Self {
        tracing::info!(
            backend = %backend.store().kind(),
            prefix = %config.key_prefix(),
            default_ttl = config.default_ttl_seconds(),
            "Cache provider initialized"
        );

        Self {
            backend,
            config,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Provider backed by a fresh in-memory store.
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::new(Backend::Memory(InMemoryStore::new()), config)
    }

    /// Provider backed by Redis when `redis` is given and reachable.
    pub async fn connect(config: CacheConfig, redis: Option<RedisConfig>) -> Self {
        Self::new(Backend::select(redis).await, config)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend_type(&self) -> BackendKind {
        self.backend.store().kind()
    }

    pub fn is_available(&self) -> bool {
        self.backend.store().is_available()
    }

    fn key(&self, key: &str) -> String {
        self.config.physical_key(key)
    }

    /// Get and deserialize a value. Misses, expired keys and values that
    /// fail to deserialize all yield `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.backend.store().get(&self.key(key)).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding malformed cached value");
                None
            }
        }
    }

    /// Serialize and store a value. `None` (or zero) uses the default TTL.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        let raw =
            serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let ttl = ttl_seconds
            .filter(|t| *t > 0)
            .unwrap_or(self.config.default_ttl_seconds());

        self.backend.store().set(&self.key(key), &raw, ttl).await;
        Ok(())
    }

    /// Serialize and overwrite an existing value without touching its
    /// expiry. `Ok(false)` when the key is missing or already expired.
    pub async fn replace<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<bool, CacheError> {
        let raw =
            serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        Ok(self.backend.store().replace(&self.key(key), &raw).await)
    }

    pub async fn has(&self, key: &str) -> bool {
        self.backend.store().exists(&self.key(key)).await
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.backend.store().delete(&self.key(key)).await
    }

    /// Delete all keys matching `pattern` (only `*` is a wildcard).
    pub async fn delete_pattern(&self, pattern: &str) -> u64 {
        self.backend.store().delete_pattern(&self.key(pattern)).await
    }

    pub async fn incr(&self, key: &str) -> i64 {
        self.backend.store().incr(&self.key(key)).await
    }

    pub async fn ttl(&self, key: &str) -> KeyTtl {
        self.backend.store().ttl(&self.key(key)).await
    }

    pub async fn expire(&self, key: &str, seconds: u64) -> bool {
        self.backend.store().expire(&self.key(key), seconds).await
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// Concurrent callers in this process that miss on the same key wait
    /// for a single factory run. Callers in other processes sharing a
    /// networked backend are not coordinated and may compute in parallel.
    pub async fn get_or_set<T, F, Fut>(&self, key: &str, factory: F, ttl_seconds: Option<u64>) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let result: Result<T, Infallible> = self
            .try_get_or_set(key, move || async move { Ok(factory().await) }, ttl_seconds)
            .await;
        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`CacheProvider::get_or_set`] for fallible factories. Errors
    /// are returned to the caller and nothing is cached.
    pub async fn try_get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        factory: F,
        ttl_seconds: Option<u64>,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(key).await {
            return Ok(hit);
        }

        let lock = self.key_lock(key).await;
        let result = {
            let _guard = lock.lock().await;

            // Another caller may have filled the key while we waited.
            match self.get::<T>(key).await {
                Some(hit) => Ok(hit),
                None => match factory().await {
                    Ok(value) => {
                        if let Err(e) = self.set(key, &value, ttl_seconds).await {
                            tracing::warn!(key = %key, error = %e, "Computed value not cached");
                        }
                        Ok(value)
                    }
                    Err(e) => Err(e),
                },
            }
        };
        self.release_key_lock(key, lock).await;

        result
    }

    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().await;
        in_flight.entry(key.to_string()).or_default().clone()
    }

    async fn release_key_lock(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().await;
        // Only the registry and this handle left: nobody else is waiting.
        if Arc::strong_count(&lock) <= 2 {
            in_flight.remove(key);
        }
    }

    /// Remove everything this provider stored.
    ///
    /// The in-memory backend is cleared outright; on Redis every key under
    /// the provider prefix is deleted. A networked provider without a key
    /// prefix shares the whole database, so its reset deletes nothing.
    pub async fn reset(&self) {
        match &self.backend {
            Backend::Memory(store) => store.clear().await,
            #[cfg(feature = "redis")]
            Backend::Networked(_) if self.config.key_prefix().is_empty() => {
                tracing::warn!("Refusing to reset a networked cache without a key prefix");
            }
            #[cfg(feature = "redis")]
            Backend::Networked(_) => {
                let removed = self.delete_pattern("*").await;
                tracing::info!(removed, "Cache reset");
            }
        }
        self.in_flight.lock().await.clear();
    }
}
