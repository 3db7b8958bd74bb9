//! Read-through cache orchestration.
//!
//! Each cache entry moves through `absent -> computing -> present(ttl) ->
//! absent`; there is no stale-but-served state. Two hazards are handled
//! explicitly here rather than delegated to the backing store:
//!
//! - thundering herd on a hot key: a per-key async mutex guarantees at most
//!   one concurrent computation per key, with waiters re-probing the store
//!   once the winner has populated it;
//! - invalidation racing an in-flight recompute: a per-key generation stamp
//!   is read before the cache probe and checked again before write-back, so
//!   an invalidation issued mid-compute always wins.

use crate::store::CacheStore;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Read-through cache over an arbitrary [`CacheStore`].
///
/// Cache-store failures degrade: a failed read counts as a miss and a failed
/// write is logged while the computed value is still returned. Compute
/// failures propagate untouched and never leave a cached value behind.
///
/// Flight locks are removed when the last waiter for a key finishes, so
/// `flights` tracks only keys with a computation in progress. `generations`
/// holds one `u64` per invalidated key and is retained for the process
/// lifetime: a late write-back from a long-finished flight must still
/// observe the bump.
pub struct ReadThroughCache<S> {
    store: Arc<S>,
    flights: DashMap<String, Arc<Mutex<()>>>,
    generations: DashMap<String, u64>,
}

impl<S: CacheStore> ReadThroughCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store, flights: DashMap::new(), generations: DashMap::new() }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// `compute` runs at most once per key across concurrent callers; losers
    /// of the single-flight race pick up the winner's stored value. An `Err`
    /// from `compute` propagates without being cached.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // Stamp before the probe so an invalidation arriving at any point
        // after this line forces the write-back to be skipped.
        let generation = self.generation(key);

        if let Some(value) = self.probe(key).await {
            return Ok(value);
        }

        let flight = self
            .flights
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = flight.lock().await;

            // A concurrent flight may have populated the entry while we waited.
            if let Some(value) = self.probe(key).await {
                Ok(value)
            } else {
                match compute().await {
                    Ok(value) => {
                        if self.generation(key) == generation {
                            self.write_back(key, &value, ttl).await;
                        } else {
                            tracing::debug!(
                                "cache entry {} invalidated during recompute, skipping write-back",
                                key
                            );
                        }
                        Ok(value)
                    }
                    Err(e) => Err(e),
                }
            }
        };

        // Drop the flight entry once the last waiter is done with it. Our
        // own handle is released first, so a count of 1 means only the map
        // still holds the lock; the shard lock makes the check and removal
        // atomic against new arrivals.
        drop(flight);
        self.flights.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    /// Explicitly invalidate a single key.
    ///
    /// Bumps the key's generation first so that any in-flight computation for
    /// the key cannot repopulate the entry with pre-invalidation data.
    pub async fn invalidate(&self, key: &str) {
        *self.generations.entry(key.to_string()).or_insert(0) += 1;

        if let Err(e) = self.store.delete(key).await {
            tracing::warn!("cache delete failed for {}: {}", key, e);
        }
        tracing::debug!("cache entry invalidated: {}", key);
    }

    fn generation(&self, key: &str) -> u64 {
        self.generations.get(key).map(|g| *g).unwrap_or(0)
    }

    async fn probe<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("cache entry {} failed to deserialize, recomputing: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("cache read failed for {}, degrading to recompute: {}", key, e);
                None
            }
        }
    }

    async fn write_back<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(json) => {
                if let Err(e) = self.store.set(key, json, ttl).await {
                    tracing::warn!("cache write failed for {}, serving uncached value: {}", key, e);
                }
            }
            Err(e) => {
                tracing::warn!("failed to serialize cache value for {}: {}", key, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CacheError, Result as CacheResult};
    use crate::store::InMemoryCacheStore;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    /// Store that fails every operation, for degradation tests.
    struct UnreachableStore;

    #[async_trait::async_trait]
    impl CacheStore for UnreachableStore {
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            Err(CacheError::StoreUnavailable("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> CacheResult<()> {
            Err(CacheError::StoreUnavailable("connection refused".into()))
        }

        async fn delete(&self, _key: &str) -> CacheResult<()> {
            Err(CacheError::StoreUnavailable("connection refused".into()))
        }
    }

    fn cache() -> ReadThroughCache<InMemoryCacheStore> {
        ReadThroughCache::new(Arc::new(InMemoryCacheStore::new()))
    }

    #[tokio::test]
    async fn test_miss_computes_and_caches() {
        let cache = cache();
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let value: u32 = cache
                .get_or_compute("k", Duration::from_secs(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CacheError>(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_compute_error_is_not_cached() {
        let cache = cache();

        let result: Result<u32, CacheError> = cache
            .get_or_compute("k", Duration::from_secs(60), || async {
                Err(CacheError::StoreUnavailable("event store down".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.store().get("k").await.unwrap(), None);

        // A later successful compute fills the entry normally.
        let value: u32 = cache
            .get_or_compute("k", Duration::from_secs(60), || async { Ok::<_, CacheError>(3) })
            .await
            .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight_computes_once() {
        let cache = Arc::new(cache());
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("hot", Duration::from_secs(60), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<_, CacheError>(42u32)
                    })
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidation_wins_over_inflight_recompute() {
        let cache = Arc::new(cache());
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let task = {
            let cache = cache.clone();
            let entered = entered.clone();
            let release = release.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute("k", Duration::from_secs(60), || async move {
                        entered.notify_one();
                        release.notified().await;
                        Ok::<_, CacheError>(1u32)
                    })
                    .await
                    .unwrap()
            })
        };

        // Invalidate while the compute is in flight, then let it finish.
        entered.notified().await;
        cache.invalidate("k").await;
        release.notify_one();

        assert_eq!(task.await.unwrap(), 1);
        // The stale result must not have been written back.
        assert_eq!(cache.store().get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flight_entries_are_pruned_after_use() {
        let cache = cache();

        for key in ["a", "b", "c"] {
            let _: u32 = cache
                .get_or_compute(key, Duration::from_secs(60), || async { Ok::<_, CacheError>(1) })
                .await
                .unwrap();
        }

        assert!(cache.flights.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_flight_entries_are_pruned_after_contention() {
        let cache = Arc::new(cache());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let _: u32 = cache
                    .get_or_compute("hot", Duration::from_secs(60), || async {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, CacheError>(1)
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(cache.flights.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_removes_cached_value() {
        let cache = cache();

        let _: u32 = cache
            .get_or_compute("k", Duration::from_secs(60), || async { Ok::<_, CacheError>(1) })
            .await
            .unwrap();
        cache.invalidate("k").await;

        let value: u32 = cache
            .get_or_compute("k", Duration::from_secs(60), || async { Ok::<_, CacheError>(2) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_unreachable_store_degrades_to_recompute() {
        let cache = ReadThroughCache::new(Arc::new(UnreachableStore));
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let value: u32 = cache
                .get_or_compute("k", Duration::from_secs(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CacheError>(9)
                })
                .await
                .unwrap();
            assert_eq!(value, 9);
        }

        // Every read recomputes; cache failures never surface to the caller.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_recomputes() {
        let cache = cache();

        let _: u32 = cache
            .get_or_compute("k", Duration::from_millis(10), || async { Ok::<_, CacheError>(1) })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let value: u32 = cache
            .get_or_compute("k", Duration::from_secs(60), || async { Ok::<_, CacheError>(2) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }
}
