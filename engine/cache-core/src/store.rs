//! Cache store trait and in-memory implementation.

use crate::error::Result;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Abstract trait for cache store backends.
///
/// Values are serialized strings; the backing store is never assumed to
/// support pattern or wildcard deletion, so invalidation always happens by
/// explicit key. Every call is a blocking I/O boundary that can fail
/// independently of the event store.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a value; `None` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value with the given TTL, replacing any previous entry.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Delete a single entry by exact key.
    async fn delete(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory cache store (for testing and single-process embedding).
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: DashMap<String, Entry>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (possibly expired, not yet reaped) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => return Ok(None),
        };

        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let entry = Entry { value, expires_at: Instant::now() + ttl };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
