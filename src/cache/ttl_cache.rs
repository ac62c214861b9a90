use chrono::{DateTime, Utc};
use lru::LruCache;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use super::VolatilityPolicy;
use crate::clock::Clock;
use crate::error::Result;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    created_at: DateTime<Utc>,
    value: V,
}

struct Entries<V> {
    lru: LruCache<String, CacheEntry<V>>,
    /// Bumped by every `clear()`.
    generation: u64,
}

/// Thread-safe keyed cache with per-key lifetimes.
///
/// Entries are checked against the policy on read; expired entries are
/// dropped at that point. With `max_entries` set, the least recently used
/// entry is evicted once the bound is reached.
pub struct TtlCache<V> {
    entries: Mutex<Entries<V>>,
    policy: Box<dyn VolatilityPolicy>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(
        policy: impl VolatilityPolicy + 'static,
        clock: Arc<dyn Clock>,
        max_entries: Option<usize>,
    ) -> Self {
        let lru = match max_entries.and_then(NonZeroUsize::new) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };

        Self {
            entries: Mutex::new(Entries { lru, generation: 0 }),
            policy: Box::new(policy),
            clock,
        }
    }

    /// Fresh value under `key`, if any.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();

        if let Some(entry) = entries.lru.get(key) {
            let fresh = match self.policy.lifetime(key) {
                Some(lifetime) => now - entry.created_at < lifetime,
                None => true,
            };
            if fresh {
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }

        entries.lru.pop(key);
        None
    }

    /// Store `value` under `key`, stamped with the current time.
    pub fn put(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            created_at: self.clock.now(),
            value,
        };
        self.lock().lru.put(key.into(), entry);
    }

    /// Cached value for `key`, or the result of `compute` stored under it.
    ///
    /// The lock is not held while computing, so concurrent misses on the same
    /// key may compute twice; the last result stored wins. A result whose
    /// computation overlapped a `clear()` is returned but not stored. Errors
    /// are returned and not cached.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.get(key) {
            log::debug!("Cache hit: {}", key);
            return Ok(value);
        }

        log::debug!("Cache miss: {}", key);
        let generation = self.lock().generation;
        let value = compute().await?;

        let created_at = self.clock.now();
        let mut entries = self.lock();
        if entries.generation == generation {
            let entry = CacheEntry {
                created_at,
                value: value.clone(),
            };
            entries.lru.put(key.to_string(), entry);
        } else {
            log::debug!("Cache cleared while computing {}, result not stored", key);
        }
        Ok(value)
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.lru.clear();
        entries.generation += 1;
    }

    pub fn len(&self) -> usize {
        self.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().lru.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Entries<V>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MarkerPolicy;
    use crate::clock::ManualClock;
    use crate::error::HierarchyError;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const STABLE: &str = "/hierarchies/h1/target/n1?levels=1";
    const VOLATILE: &str = "/hierarchies/h1/target/n1?filter=f&filter-status=draft";

    fn cache(clock: Arc<ManualClock>, max_entries: Option<usize>) -> TtlCache<Vec<String>> {
        TtlCache::new(
            MarkerPolicy::new(vec!["filter-status".to_string()], Duration::hours(1)),
            clock,
            max_entries,
        )
    }

    async fn counted(cache: &TtlCache<Vec<String>>, key: &str, calls: &AtomicUsize) -> Vec<String> {
        cache
            .get_or_compute(key, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["A".to_string()])
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_stable_key_computes_once() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(clock.clone(), None);
        let calls = AtomicUsize::new(0);

        assert_eq!(counted(&cache, STABLE, &calls).await, vec!["A"]);
        assert_eq!(counted(&cache, STABLE, &calls).await, vec!["A"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // stable entries never age out
        clock.advance(Duration::days(365));
        counted(&cache, STABLE, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_volatile_key_recomputes_after_lifetime() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(clock.clone(), None);
        let calls = AtomicUsize::new(0);

        counted(&cache, VOLATILE, &calls).await;
        counted(&cache, VOLATILE, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::minutes(61));
        counted(&cache, VOLATILE, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_not_cached() {
        let cache = cache(Arc::new(ManualClock::default()), None);
        let result = cache
            .get_or_compute(STABLE, || async { Err(HierarchyError::Store("down".to_string())) })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entry_dropped_on_read() {
        let clock = Arc::new(ManualClock::default());
        let cache = cache(clock.clone(), None);
        cache.put(VOLATILE, vec!["A".to_string()]);
        cache.put(STABLE, vec!["B".to_string()]);
        assert_eq!(cache.len(), 2);

        clock.advance(Duration::hours(2));
        assert!(cache.get(VOLATILE).is_none());
        assert_eq!(cache.get(STABLE), Some(vec!["B".to_string()]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = cache(Arc::new(ManualClock::default()), None);
        cache.put(STABLE, vec!["A".to_string()]);
        cache.put(VOLATILE, vec!["B".to_string()]);
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert!(cache.get(STABLE).is_none());
    }

    #[tokio::test]
    async fn test_clear_during_compute_drops_result() {
        let cache = Arc::new(cache(Arc::new(ManualClock::default()), None));
        let (release, parked) = tokio::sync::oneshot::channel::<()>();
        let (started_tx, started) = tokio::sync::oneshot::channel::<()>();

        let task = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute(STABLE, move || async move {
                        let _ = started_tx.send(());
                        let _ = parked.await;
                        Ok(vec!["stale".to_string()])
                    })
                    .await
            })
        };

        started.await.unwrap();
        cache.clear();
        release.send(()).unwrap();

        assert_eq!(task.await.unwrap().unwrap(), vec!["stale"]);
        assert_eq!(cache.len(), 0);

        // later computes are stored again
        let calls = AtomicUsize::new(0);
        counted(&cache, STABLE, &calls).await;
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_bounded_evicts_least_recent() {
        let cache = cache(Arc::new(ManualClock::default()), Some(2));
        cache.put("a", vec![]);
        cache.put("b", vec![]);
        let _ = cache.get("a");
        cache.put("c", vec![]);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert_eq!(cache.len(), 2);
    }
}
