//! Redis cache store with connection management and failure isolation.
//!
//! No operation returns an error to the caller. A failed or timed-out
//! command is logged and answered with the negative result, so a caller
//! sees "empty" rather than "down". [`CacheStore::is_available`] reflects
//! the connectivity probe and is the only authoritative health signal.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{
    AsyncCommands, Client, ExistenceCheck, IntoConnectionInfo, RedisResult, SetExpiry, SetOptions,
    Value,
};

use cachet_core::ports::{BackendKind, CacheError, CacheStore, KeyTtl, MAX_TTL_SECONDS};

use super::config::RedisConfig;
use super::pattern::glob_to_redis;

const SCAN_BATCH: usize = 200;

/// Redis-backed cache store.
///
/// Uses connection manager for automatic reconnection.
pub struct RedisStore {
    conn: ConnectionManager,
    config: RedisConfig,
    available: AtomicBool,
}

impl RedisStore {
    /// Connect and probe the server with `PING`.
    ///
    /// Fails if the client cannot be built, the connection cannot be
    /// established, or the probe does not answer within `connect_timeout`.
    pub async fn connect(config: RedisConfig) -> Result<Self, CacheError> {
        let mut info = config
            .url
            .as_str()
            .into_connection_info()
            .map_err(|e| CacheError::Connection(e.to_string()))?;
        if let Some(password) = &config.password {
            info.redis.password = Some(password.clone());
        }

        let client = Client::open(info).map_err(|e| CacheError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client);
        let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| CacheError::Connection("Connection timed out".to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let store = Self {
            conn,
            config,
            available: AtomicBool::new(false),
        };

        if !store.probe().await {
            return Err(CacheError::Connection("PING probe failed".to_string()));
        }

        tracing::info!(url = %store.config.url, "Connected to Redis cache");

        Ok(store)
    }

    /// Re-run the connectivity probe and record the outcome.
    pub async fn probe(&self) -> bool {
        let mut conn = self.conn.clone();
        let pong: Result<RedisResult<String>, _> = tokio::time::timeout(
            self.config.connect_timeout,
            redis::cmd("PING").query_async(&mut conn),
        )
        .await;

        let ok = matches!(pong, Ok(Ok(ref reply)) if reply == "PONG");
        if !ok {
            tracing::warn!(url = %self.config.url, "Redis PING probe failed");
        }
        self.available.store(ok, Ordering::Relaxed);
        ok
    }

    /// Run one command under the operation timeout, logging any failure.
    async fn run<T, F>(&self, op: &'static str, key: &str, fut: F) -> Option<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.config.op_timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                tracing::warn!(op, key = %key, error = %e, "Redis command failed");
                None
            }
            Err(_) => {
                tracing::warn!(op, key = %key, "Redis command timed out");
                None
            }
        }
    }

    async fn scan(&self, pattern: &str) -> Option<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = self
                .run("SCAN", pattern, async {
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn)
                        .await
                })
                .await?;

            keys.extend(batch);
            if next == 0 {
                return Some(keys);
            }
            cursor = next;
        }
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        self.run("GET", key, async move { conn.get::<_, Option<String>>(key).await })
            .await
            .flatten()
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) {
        let mut conn = self.conn.clone();
        if ttl_seconds > MAX_TTL_SECONDS {
            self.run("SET", key, async move { conn.set::<_, _, ()>(key, value).await })
                .await;
            return;
        }
        self.run("SET", key, async move {
            conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await
        })
        .await;
    }

    async fn replace(&self, key: &str, value: &str) -> bool {
        let mut conn = self.conn.clone();
        // XX: only an existing key; KEEPTTL: leave its expiry untouched
        let options = SetOptions::default()
            .conditional_set(ExistenceCheck::XX)
            .with_expiration(SetExpiry::KEEPTTL);
        self.run("SET", key, async move {
            conn.set_options::<_, _, Value>(key, value, options).await
        })
        .await
        .is_some_and(|reply| !matches!(reply, Value::Nil))
    }

    async fn exists(&self, key: &str) -> bool {
        let mut conn = self.conn.clone();
        self.run("EXISTS", key, async move { conn.exists::<_, bool>(key).await })
            .await
            .unwrap_or(false)
    }

    async fn delete(&self, key: &str) -> bool {
        let mut conn = self.conn.clone();
        self.run("DEL", key, async move { conn.del::<_, u64>(key).await })
            .await
            .is_some_and(|n| n > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> u64 {
        let matcher = glob_to_redis(pattern);
        let Some(keys) = self.scan(&matcher).await else {
            return 0;
        };

        let mut removed = 0;
        for chunk in keys.chunks(SCAN_BATCH) {
            let mut conn = self.conn.clone();
            removed += self
                .run("DEL", pattern, async move { conn.del::<_, u64>(chunk).await })
                .await
                .unwrap_or(0);
        }

        tracing::debug!(pattern = %pattern, removed, "Deleted keys by pattern");
        removed
    }

    async fn incr(&self, key: &str) -> i64 {
        let mut conn = self.conn.clone();
        self.run("INCR", key, async move { conn.incr::<_, _, i64>(key, 1).await })
            .await
            .unwrap_or(0)
    }

    async fn ttl(&self, key: &str) -> KeyTtl {
        let mut conn = self.conn.clone();
        self.run("TTL", key, async move { conn.ttl::<_, i64>(key).await })
            .await
            .map(KeyTtl::from_seconds)
            .unwrap_or(KeyTtl::Missing)
    }

    async fn expire(&self, key: &str, seconds: u64) -> bool {
        let mut conn = self.conn.clone();
        if seconds > MAX_TTL_SECONDS {
            self.run("PERSIST", key, async move { conn.persist::<_, bool>(key).await })
                .await;
            return self.exists(key).await;
        }
        let seconds = seconds as i64;
        self.run("EXPIRE", key, async move { conn.expire::<_, bool>(key, seconds).await })
            .await
            .unwrap_or(false)
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Networked
    }
}
