//! Bounded in-process cache for memoizing analysis results.
//!
//! Unlike the provider backends this cache has a hard capacity. When an
//! insert would exceed it, expired entries are purged first and then the
//! entry with the fewest hits is evicted, oldest first on ties.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use cachet_core::ConfigError;

struct Slot<V> {
    value: V,
    inserted_at: Instant,
    hits: u64,
}

/// Counters reported by [`BoundedCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundedCacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Inner<V> {
    entries: HashMap<String, Slot<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

pub struct BoundedCache<V> {
    inner: Mutex<Inner<V>>,
    capacity: usize,
    ttl: Duration,
}

impl<V: Clone> BoundedCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if ttl.is_zero() {
            return Err(ConfigError::NonPositiveTtl);
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            capacity,
            ttl,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, slot: &Slot<V>, now: Instant) -> bool {
        now.duration_since(slot.inserted_at) >= self.ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.lock();

        let expired = match inner.entries.get(key) {
            Some(slot) => self.is_expired(slot, now),
            None => {
                inner.misses += 1;
                return None;
            }
        };

        if expired {
            inner.entries.remove(key);
            inner.misses += 1;
            return None;
        }

        inner.hits += 1;
        let slot = inner.entries.get_mut(key)?;
        slot.hits += 1;
        Some(slot.value.clone())
    }

    /// Insert or replace a value. Replacing resets its age and hit count.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = Instant::now();
        let mut inner = self.lock();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            inner.entries.retain(|_, slot| now.duration_since(slot.inserted_at) < self.ttl);

            if inner.entries.len() >= self.capacity {
                let victim = inner
                    .entries
                    .iter()
                    .min_by(|(_, a), (_, b)| {
                        a.hits
                            .cmp(&b.hits)
                            .then_with(|| a.inserted_at.cmp(&b.inserted_at))
                    })
                    .map(|(k, _)| k.clone());

                if let Some(victim) = victim {
                    inner.entries.remove(&victim);
                    inner.evictions += 1;
                    tracing::debug!(key = %victim, "Evicted analysis cache entry");
                }
            }
        }

        inner.entries.insert(
            key,
            Slot {
                value,
                inserted_at: now,
                hits: 0,
            },
        );
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.lock().entries.remove(key).map(|slot| slot.value)
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
        inner.evictions = 0;
    }

    /// Number of stored entries, expired ones included until touched.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> BoundedCacheStats {
        let inner = self.lock();
        BoundedCacheStats {
            size: inner.entries.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> BoundedCache<String> {
        BoundedCache::new(capacity, Duration::from_secs(60)).unwrap()
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            BoundedCache::<u32>::new(0, Duration::from_secs(1)),
            Err(ConfigError::ZeroCapacity)
        ));
        assert!(matches!(
            BoundedCache::<u32>::new(10, Duration::ZERO),
            Err(ConfigError::NonPositiveTtl)
        ));
    }

    #[tokio::test]
    async fn test_get_and_stats() {
        let cache = cache(4);
        cache.insert("a", "alpha".to_string());

        assert_eq!(cache.get("a"), Some("alpha".to_string()));
        assert_eq!(cache.get("b"), None);

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evicts_fewest_hits() {
        let cache = cache(2);
        cache.insert("popular", "p".to_string());
        tokio::time::advance(Duration::from_millis(10)).await;
        cache.insert("ignored", "i".to_string());

        cache.get("popular");
        cache.get("popular");

        cache.insert("new", "n".to_string());

        assert_eq!(cache.len(), 2);
        assert!(cache.get("ignored").is_none());
        assert!(cache.get("popular").is_some());
        assert!(cache.get("new").is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tie_breaks_on_oldest() {
        let cache = cache(2);
        cache.insert("old", "o".to_string());
        tokio::time::advance(Duration::from_millis(10)).await;
        cache.insert("young", "y".to_string());
        tokio::time::advance(Duration::from_millis(10)).await;

        cache.insert("newest", "n".to_string());

        assert!(cache.get("old").is_none());
        assert!(cache.get("young").is_some());
        assert!(cache.get("newest").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_purged_before_eviction() {
        let cache = BoundedCache::new(2, Duration::from_secs(5)).unwrap();
        cache.insert("stale", 1u32);
        tokio::time::advance(Duration::from_secs(4)).await;
        cache.insert("fresh", 2u32);
        cache.get("stale");
        tokio::time::advance(Duration::from_secs(2)).await;

        cache.insert("next", 3u32);

        assert_eq!(cache.get("fresh"), Some(2));
        assert_eq!(cache.get("next"), Some(3));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let cache = BoundedCache::new(8, Duration::from_secs(5)).unwrap();
        cache.insert("k", 1u32);
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_replace_does_not_evict() {
        let cache = cache(1);
        cache.insert("k", "v1".to_string());
        cache.insert("k", "v2".to_string());
        assert_eq!(cache.get("k"), Some("v2".to_string()));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = cache(4);
        cache.insert("a", "1".to_string());
        cache.insert("b", "2".to_string());

        assert_eq!(cache.remove("a"), Some("1".to_string()));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), BoundedCacheStats {
            capacity: 4,
            ..BoundedCacheStats::default()
        });
    }
}
