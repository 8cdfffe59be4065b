//! In-memory cache store - used as fallback when Redis is unavailable.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use cachet_core::ports::{BackendKind, CacheStore, KeyTtl, MAX_TTL_SECONDS};

use super::pattern::glob_to_regex;

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// In-memory cache using a HashMap behind an async RwLock.
///
/// Expiry is lazy: entries are checked and dropped when they are touched,
/// there is no background sweep. Every mutation takes the write lock, which
/// is what makes `incr` atomic across tasks.
/// Note: Data is lost on process restart.
pub struct InMemoryStore {
    store: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let store = self.store.read().await;
        store.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    /// Remove `key` if it has expired. Must be called with the write lock held.
    fn purge_expired(store: &mut HashMap<String, CacheEntry>, key: &str, now: Instant) {
        if store.get(key).is_some_and(|e| e.is_expired(now)) {
            store.remove(key);
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Expiry instant `seconds` from `now`. `None` (no expiry) past
/// [`MAX_TTL_SECONDS`] or when the clock cannot represent it.
fn deadline(now: Instant, seconds: u64) -> Option<Instant> {
    if seconds > MAX_TTL_SECONDS {
        return None;
    }
    now.checked_add(Duration::from_secs(seconds))
}

fn ceil_secs(remaining: Duration) -> u64 {
    remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
}

#[async_trait]
impl CacheStore for InMemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let store = self.store.read().await;
        let entry = store.get(key)?;

        if entry.is_expired(now) {
            drop(store);
            // Clean up expired entry with write lock
            let mut store = self.store.write().await;
            Self::purge_expired(&mut store, key, now);
            return None;
        }

        Some(entry.value.clone())
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) {
        let mut store = self.store.write().await;

        store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: deadline(Instant::now(), ttl_seconds),
            },
        );
    }

    async fn replace(&self, key: &str, value: &str) -> bool {
        let now = Instant::now();
        let mut store = self.store.write().await;
        Self::purge_expired(&mut store, key, now);

        match store.get_mut(key) {
            Some(entry) => {
                entry.value = value.to_string();
                true
            }
            None => false,
        }
    }

    async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    async fn delete(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut store = self.store.write().await;
        store
            .remove(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    async fn delete_pattern(&self, pattern: &str) -> u64 {
        let re = match glob_to_regex(pattern) {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "Invalid delete pattern");
                return 0;
            }
        };

        let now = Instant::now();
        let mut store = self.store.write().await;
        let mut removed = 0;
        store.retain(|key, entry| {
            if !re.is_match(key) {
                return true;
            }
            if !entry.is_expired(now) {
                removed += 1;
            }
            false
        });

        tracing::debug!(pattern = %pattern, removed, "Deleted keys by pattern");
        removed
    }

    async fn incr(&self, key: &str) -> i64 {
        let now = Instant::now();
        let mut store = self.store.write().await;
        Self::purge_expired(&mut store, key, now);

        let Some(entry) = store.get_mut(key) else {
            store.insert(
                key.to_string(),
                CacheEntry {
                    value: "1".to_string(),
                    expires_at: None,
                },
            );
            return 1;
        };

        match entry.value.parse::<i64>().ok().and_then(|n| n.checked_add(1)) {
            Some(next) => {
                entry.value = next.to_string();
                next
            }
            None => {
                tracing::warn!(key = %key, "INCR on a value that is not an integer");
                0
            }
        }
    }

    async fn ttl(&self, key: &str) -> KeyTtl {
        let now = Instant::now();
        let mut store = self.store.write().await;
        Self::purge_expired(&mut store, key, now);

        match store.get(key) {
            None => KeyTtl::Missing,
            Some(CacheEntry {
                expires_at: None, ..
            }) => KeyTtl::Persistent,
            Some(CacheEntry {
                expires_at: Some(exp),
                ..
            }) => KeyTtl::Expires(ceil_secs(*exp - now)),
        }
    }

    async fn expire(&self, key: &str, seconds: u64) -> bool {
        let now = Instant::now();
        let mut store = self.store.write().await;
        Self::purge_expired(&mut store, key, now);

        if seconds == 0 {
            return store.remove(key).is_some();
        }

        match store.get_mut(key) {
            Some(entry) => {
                entry.expires_at = deadline(now, seconds);
                true
            }
            None => false,
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryStore::new();
        cache.set("key1", "value1", 60).await;
        assert_eq!(cache.get("key1").await, Some("value1".to_string()));
        assert!(cache.exists("key1").await);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let cache = InMemoryStore::new();
        assert_eq!(cache.get("nope").await, None);
        assert!(!cache.exists("nope").await);
        assert_eq!(cache.ttl("nope").await, KeyTtl::Missing);
        assert_eq!(cache.ttl("nope").await.as_seconds(), -2);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryStore::new();
        cache.set("key1", "value1", 60).await;
        assert!(cache.delete("key1").await);
        assert!(!cache.delete("key1").await);
        assert_eq!(cache.get("key1").await, None);
    }

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let cache = InMemoryStore::new();
        cache.set("key1", "old", 10).await;
        cache.set("key1", "new", 100).await;
        assert_eq!(cache.get("key1").await, Some("new".to_string()));
        assert_eq!(cache.ttl("key1").await, KeyTtl::Expires(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_expiry() {
        let cache = InMemoryStore::new();
        cache.set("key1", "value1", 2).await;

        tokio::time::advance(Duration::from_millis(2100)).await;

        assert!(!cache.exists("key1").await);
        assert_eq!(cache.get("key1").await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_rounds_up() {
        let cache = InMemoryStore::new();
        cache.set("key1", "value1", 10).await;

        tokio::time::advance(Duration::from_millis(9500)).await;
        assert_eq!(cache.ttl("key1").await, KeyTtl::Expires(1));
    }

    #[tokio::test]
    async fn test_incr_sequence() {
        let cache = InMemoryStore::new();
        assert_eq!(cache.incr("counter").await, 1);
        assert_eq!(cache.incr("counter").await, 2);
        assert_eq!(cache.incr("counter").await, 3);
        assert_eq!(cache.ttl("counter").await, KeyTtl::Persistent);
        assert_eq!(cache.get("counter").await, Some("3".to_string()));
    }

    #[tokio::test]
    async fn test_incr_keeps_expiry() {
        let cache = InMemoryStore::new();
        cache.incr("counter").await;
        assert!(cache.expire("counter", 60).await);
        cache.incr("counter").await;
        assert_eq!(cache.ttl("counter").await, KeyTtl::Expires(60));
    }

    #[tokio::test]
    async fn test_incr_non_integer() {
        let cache = InMemoryStore::new();
        cache.set("text", "\"hello\"", 60).await;
        assert_eq!(cache.incr("text").await, 0);
        assert_eq!(cache.get("text").await, Some("\"hello\"".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_incr_does_not_revive_expired_key() {
        let cache = InMemoryStore::new();
        cache.set("counter", "41", 1).await;

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(cache.incr("counter").await, 1);
        assert_eq!(cache.ttl("counter").await, KeyTtl::Persistent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_on_expired_key() {
        let cache = InMemoryStore::new();
        cache.set("key1", "value1", 1).await;

        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(!cache.expire("key1", 60).await);
        assert_eq!(cache.get("key1").await, None);
    }

    #[tokio::test]
    async fn test_expire_missing_key() {
        let cache = InMemoryStore::new();
        assert!(!cache.expire("ghost", 60).await);
        assert_eq!(cache.ttl("ghost").await, KeyTtl::Missing);
    }

    #[tokio::test]
    async fn test_expire_zero_removes() {
        let cache = InMemoryStore::new();
        cache.set("key1", "value1", 60).await;
        assert!(cache.expire("key1", 0).await);
        assert!(!cache.exists("key1").await);
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let cache = InMemoryStore::new();
        cache.set("prefix:a", "1", 60).await;
        cache.set("prefix:b", "2", 60).await;
        cache.set("prefix:c:d", "3", 60).await;
        cache.set("other:key", "4", 60).await;

        assert_eq!(cache.delete_pattern("prefix:*").await, 3);
        assert!(!cache.exists("prefix:a").await);
        assert!(cache.exists("other:key").await);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_huge_ttl_is_persistent() {
        let cache = InMemoryStore::new();
        cache.set("k", "1", u64::MAX / 2).await;
        assert_eq!(cache.get("k").await, Some("1".to_string()));
        assert_eq!(cache.ttl("k").await, KeyTtl::Persistent);

        cache.set("j", "1", 60).await;
        assert!(cache.expire("j", u64::MAX).await);
        assert_eq!(cache.get("j").await, Some("1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_keeps_expiry() {
        let cache = InMemoryStore::new();
        assert!(!cache.replace("k", "v").await);
        assert_eq!(cache.get("k").await, None);

        cache.set("k", "old", 10).await;
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(cache.replace("k", "new").await);
        assert_eq!(cache.get("k").await, Some("new".to_string()));
        assert_eq!(cache.ttl("k").await, KeyTtl::Expires(6));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.get("k").await, None);
        assert!(!cache.replace("k", "late").await);
    }

    #[tokio::test]
    async fn test_delete_pattern_spans_newlines() {
        let cache = InMemoryStore::new();
        cache.set("prefix:a\nb", "1", 60).await;
        assert_eq!(cache.delete_pattern("prefix:*").await, 1);
        assert!(!cache.exists("prefix:a\nb").await);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = InMemoryStore::new();
        cache.set("a", "1", 60).await;
        cache.incr("b").await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_incr_loses_nothing() {
        let cache = std::sync::Arc::new(InMemoryStore::new());

        let tasks = (0..100).map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.incr("hits").await })
        });
        let mut counts: Vec<i64> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        counts.sort_unstable();

        assert_eq!(counts, (1..=100).collect::<Vec<_>>());
    }
}
