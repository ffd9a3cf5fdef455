//! Time-bounded memoization of market snapshots

use cached::{Cached, TimedCache};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::model::Period;
use crate::service::MarketSnapshot;

/// Cache key: one snapshot per ticker and lookback period
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub symbol: String,
    pub period: Period,
}

impl SnapshotKey {
    pub fn new(symbol: impl Into<String>, period: Period) -> Self {
        Self {
            symbol: symbol.into(),
            period,
        }
    }
}

/// Thread-safe snapshot cache; clones share the same entries
#[derive(Clone)]
pub struct SnapshotCache {
    cache: Arc<RwLock<TimedCache<SnapshotKey, MarketSnapshot>>>,
}

impl SnapshotCache {
    /// Create a new cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a live entry
    pub async fn get(&self, key: &SnapshotKey) -> Option<MarketSnapshot> {
        // Expiry is checked on lookup, which needs the write half.
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Store a snapshot, evicting entries that have already expired
    pub async fn insert(&self, key: SnapshotKey, snapshot: MarketSnapshot) {
        let mut cache = self.cache.write().await;
        cache.flush();
        let _ = cache.cache_set(key, snapshot);
    }

    /// Return the cached entry or run `fetcher`, caching only its `Ok` value
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: SnapshotKey,
        fetcher: F,
    ) -> Result<MarketSnapshot, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MarketSnapshot, E>>,
    {
        if let Some(snapshot) = self.get(&key).await {
            debug!(symbol = %key.symbol, period = %key.period, "Snapshot cache hit");
            return Ok(snapshot);
        }

        debug!(symbol = %key.symbol, period = %key.period, "Snapshot cache miss");
        let snapshot = fetcher().await?;
        self.insert(key, snapshot.clone()).await;
        Ok(snapshot)
    }

    pub async fn invalidate(&self, key: &SnapshotKey) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(key);
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
