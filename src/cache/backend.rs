//! Cache backend seam and the in-process implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{parse_counter, CacheStore, Expiry};
use crate::error::Result;

/// Key-value service the caching layer writes through.
///
/// Implementations are dumb stores: no knowledge of namespaces, signatures or
/// records. Connectivity failures surface as `CacheError::Backend` and are
/// propagated to the caller untouched.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns the stored value, or None if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key` until `expiry`.
    async fn set(&self, key: &str, value: String, expiry: Expiry) -> Result<()>;

    /// Removes `key`, returning whether it was present.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Increments the integer at `key` (missing counts as 0) and returns the new value.
    ///
    /// The default is a read-modify-write over `get`/`set`, so two concurrent
    /// callers can both observe the same value. Backends with a native
    /// atomic increment should override it.
    async fn incr(&self, key: &str) -> Result<u64> {
        let current = match self.get(key).await? {
            Some(raw) => parse_counter(key, &raw)?,
            None => 0,
        };
        let next = current + 1;
        self.set(key, next.to_string(), Expiry::Forever).await?;
        Ok(next)
    }
}

// == Memory Cache ==
/// Process-local backend sharing one `CacheStore` behind an async lock.
///
/// Cloning is cheap and every clone sees the same entries.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    inner: Arc<RwLock<CacheStore>>,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheStore::new(max_entries))),
        }
    }

    /// Drops expired entries, returning how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.inner.write().await.cleanup_expired()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn evictions(&self) -> u64 {
        self.inner.read().await.evictions()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        // Write lock: reads update recency and may drop expired entries
        Ok(self.inner.write().await.get(key))
    }

    async fn set(&self, key: &str, value: String, expiry: Expiry) -> Result<()> {
        self.inner.write().await.set(key, value, expiry)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.inner.write().await.delete(key))
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        self.inner.write().await.incr(key)
    }
}
