//! Time-bounded memoization of read-only upstream lookups.
//!
//! Entries are keyed on a capability name plus its normalized parameters and
//! live for a fixed TTL from insertion. There is no write-triggered
//! invalidation and no request coalescing: concurrent misses on the same key
//! each go upstream and the last `put` wins. Expired entries are dropped on
//! access and swept from `put` at most once per TTL interval, so keys that are
//! never looked up again do not accumulate.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};
use tracing::trace;

use crate::metrics::CACHE_LOOKUPS;

/// Default time-to-live for cached entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Capability name plus sorted parameter pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    capability: String,
    params: BTreeMap<String, String>,
}

impl CacheKey {
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter. Insertion order does not affect equality.
    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn capability(&self) -> &str {
        &self.capability
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

#[derive(Debug)]
struct Entries {
    map: HashMap<CacheKey, CacheEntry>,
    next_sweep: Instant,
}

impl Entries {
    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.map.len();
        self.map.retain(|_, entry| entry.expires_at > now);
        before - self.map.len()
    }
}

/// In-memory response cache shared by all tool invocations.
#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<Entries>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(Entries {
                map: HashMap::new(),
                next_sweep: Instant::now() + ttl,
            }),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value for `key`, or `None` on a miss. Expired entries are removed.
    pub async fn get(&self, key: &CacheKey) -> Option<Value> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.map.get(key) {
                Some(entry) if entry.expires_at > now => {
                    CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
                    trace!(capability = %key.capability, "Cache hit");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
                    return None;
                }
            }
        }

        // Re-check under the write lock; a concurrent put may have refreshed it.
        let mut entries = self.entries.write().await;
        if entries.map.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.map.remove(key);
        }
        CACHE_LOOKUPS.with_label_values(&["expired"]).inc();
        None
    }

    /// Store `value`, replacing any existing entry and restarting its TTL.
    pub async fn put(&self, key: CacheKey, value: Value) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if now >= entries.next_sweep {
            let removed = entries.sweep(now);
            entries.next_sweep = now + self.ttl;
            if removed > 0 {
                trace!(removed, "Swept expired cache entries");
            }
        }

        entries.map.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Typed read-through: serve from cache, otherwise run `fetch` and store
    /// the result. Errors are never cached.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get(&key).await {
            if let Ok(value) = serde_json::from_value(cached) {
                return Ok(value);
            }
        }

        let fresh = fetch().await?;
        if let Ok(value) = serde_json::to_value(&fresh) {
            self.put(key, value).await;
        }
        Ok(fresh)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.next_sweep = now + self.ttl;
        entries.sweep(now)
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.map.is_empty()
    }
}
