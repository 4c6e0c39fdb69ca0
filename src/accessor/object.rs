//! Read-through accessor for single records.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::accessor::{AccessStats, CacheAccessor, CacheStats};
use crate::cache::{CacheBackend, Expiry};
use crate::durable::DurableStore;
use crate::error::{CacheError, Result};
use crate::keys::{CallArgs, EntityNamespace, KeySpace, Signature};
use crate::model::{CacheModel, LookupCriteria};

/// First key part of per-lookup entries.
const GET_CACHED: &str = "get_cached";
/// First key part of memoized method results.
const METHOD: &str = "method";
/// First key part of keys handed out to related caches.
const EXTERNAL: &str = "ext";

/// Caches `fetch_one` results per call signature.
///
/// On a miss the durable store is consulted and the record is cached with no
/// expiry. Failed lookups are never cached: a missing record is looked up
/// again on every call until it appears. Two callers missing on the same
/// signature both hit the durable store and both write the same value.
pub struct ObjectCache<M: CacheModel> {
    namespace: EntityNamespace,
    store: Arc<dyn DurableStore<M>>,
    stats: AccessStats,
}

impl<M: CacheModel> ObjectCache<M> {
    pub fn new(keys: KeySpace, store: Arc<dyn DurableStore<M>>) -> Self {
        Self {
            namespace: EntityNamespace::new(keys, M::MODEL_NAME),
            store,
            stats: AccessStats::new(),
        }
    }

    pub fn namespace(&self) -> &EntityNamespace {
        &self.namespace
    }

    pub fn store(&self) -> &Arc<dyn DurableStore<M>> {
        &self.store
    }

    pub(crate) fn access_stats(&self) -> &AccessStats {
        &self.stats
    }

    fn backend(&self) -> &Arc<dyn CacheBackend> {
        self.namespace.key_space().backend()
    }

    /// Serves `criteria` from the cache, or from `resolve` on a miss.
    ///
    /// The call signature is registered and the resolved record written back
    /// under it; errors from `resolve` are returned as-is and leave no entry.
    pub(crate) async fn read_through<F, Fut>(
        &self,
        criteria: &LookupCriteria<M::Pk>,
        resolve: F,
    ) -> Result<M>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<M>>,
    {
        let signature = self.namespace.generate_signature(&criteria.call_args()).await?;
        let key = self.lookup_key(&signature).await?;

        if let Some(raw) = self.backend().get(&key).await? {
            self.stats.record_hit();
            debug!(entity = M::MODEL_NAME, %signature, "cache hit");
            return Ok(serde_json::from_str(&raw)?);
        }

        self.stats.record_miss();
        debug!(entity = M::MODEL_NAME, %signature, "cache miss");
        let record = resolve().await.inspect_err(|err| {
            if err.is_not_found() {
                self.stats.record_not_found();
            }
        })?;

        self.put(&key, &record).await?;
        Ok(record)
    }

    /// Memoizes `compute` under `method` and the signature of `call`.
    ///
    /// The result lives in the entity namespace with no expiry, so it is
    /// dropped by `invalidate` but not by `flush`.
    pub async fn cached_call<T, F, Fut>(&self, method: &str, call: &CallArgs, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = self.method_key(method, call).await?;

        if let Some(raw) = self.backend().get(&key).await? {
            debug!(entity = M::MODEL_NAME, method, "memoized call hit");
            return Ok(serde_json::from_str(&raw)?);
        }

        let value = compute().await?;
        self.put(&key, &value).await?;
        Ok(value)
    }

    /// Overwrites the memoized result of `method` for `call`.
    pub async fn replace_call<T: Serialize>(&self, method: &str, call: &CallArgs, value: &T) -> Result<()> {
        let key = self.method_key(method, call).await?;
        self.put(&key, value).await
    }

    /// Deletes every cached lookup whose signature is registered, then
    /// empties the signature set. Returns the number of entries removed.
    pub async fn flush(&self) -> Result<usize> {
        let signatures = self.namespace.signatures().await?;

        let mut removed = 0;
        for signature in &signatures {
            let key = self.lookup_key(signature).await?;
            if self.backend().delete(&key).await? {
                removed += 1;
            }
        }
        self.namespace.clear_signatures().await?;

        info!(entity = M::MODEL_NAME, signatures = signatures.len(), removed, "flushed cached lookups");
        Ok(removed)
    }

    async fn lookup_key(&self, signature: &Signature) -> Result<String> {
        self.namespace.key(&[GET_CACHED, signature.as_str()]).await
    }

    async fn method_key(&self, method: &str, call: &CallArgs) -> Result<String> {
        let signature = call.signature();
        self.namespace.key(&[METHOD, method, signature.as_str()]).await
    }

    /// Writes `value` with no expiry. A value the backend refuses (too large)
    /// is served uncached rather than failing the lookup.
    async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        match self.backend().set(key, raw, Expiry::Forever).await {
            Err(CacheError::InvalidRequest(reason)) => {
                warn!(%key, %reason, "backend refused value, serving uncached");
                Ok(())
            }
            other => other,
        }
    }
}

#[async_trait]
impl<M: CacheModel> CacheAccessor<M> for ObjectCache<M> {
    async fn get_cached(&self, criteria: &LookupCriteria<M::Pk>) -> Result<M> {
        let store = self.store.clone();
        let stats = &self.stats;
        self.read_through(criteria, || async move {
            stats.record_durable_lookup();
            store.fetch_one(criteria).await
        })
        .await
    }

    async fn warm_cache(&self) -> Result<()> {
        Ok(())
    }

    async fn namespace_key(&self, parts: &[&str]) -> Result<String> {
        let scoped = [&[EXTERNAL][..], parts].concat();
        self.namespace.key(scoped.as_slice()).await
    }

    async fn invalidate(&self) -> Result<u64> {
        self.namespace.bump().await
    }

    fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::durable::MemoryTable;
    use crate::models::Record;

    fn setup() -> (MemoryCache, Arc<MemoryTable<Record>>, ObjectCache<Record>) {
        let backend = MemoryCache::new(1000);
        let table = Arc::new(MemoryTable::new(vec![
            Record::new(1, Some("a")),
            Record::new(2, Some("b")),
        ]));
        let keys = KeySpace::new(Arc::new(backend.clone()), "");
        let objects = ObjectCache::new(keys, table.clone());
        (backend, table, objects)
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let (_, table, objects) = setup();

        let first = objects.get_cached(&LookupCriteria::ByPrimaryKey(1)).await.unwrap();
        let second = objects.get_cached(&LookupCriteria::ByPrimaryKey(1)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(table.lookups(), 1);
        assert_eq!(objects.stats().hits, 1);
        assert_eq!(objects.stats().misses, 1);
        assert_eq!(objects.stats().durable_lookups, 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let (backend, table, objects) = setup();
        let criteria = LookupCriteria::ByPrimaryKey(3);

        assert!(objects.get_cached(&criteria).await.unwrap_err().is_not_found());
        // Only the signature set was written
        assert_eq!(backend.len().await, 1);

        table.upsert(Record::new(3, Some("c"))).await;
        assert_eq!(objects.get_cached(&criteria).await.unwrap().id, 3);
        assert_eq!(table.lookups(), 2);
        assert_eq!(objects.stats().not_found, 1);
        assert_eq!(objects.stats().durable_lookups, 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_fresh_lookup() {
        let (_, table, objects) = setup();
        let criteria = LookupCriteria::ByPrimaryKey(1);
        objects.get_cached(&criteria).await.unwrap();

        table.upsert(Record::new(1, Some("renamed"))).await;
        assert_eq!(objects.get_cached(&criteria).await.unwrap().slug.as_deref(), Some("a"));

        assert_eq!(objects.invalidate().await.unwrap(), 1);
        assert_eq!(objects.get_cached(&criteria).await.unwrap().slug.as_deref(), Some("renamed"));
        assert_eq!(table.lookups(), 2);
    }

    #[tokio::test]
    async fn test_flush_deletes_registered_lookups() {
        let (_, table, objects) = setup();
        objects.get_cached(&LookupCriteria::ByPrimaryKey(1)).await.unwrap();
        objects.get_cached(&LookupCriteria::slug("b")).await.unwrap();

        assert_eq!(objects.flush().await.unwrap(), 2);
        assert!(objects.namespace().signatures().await.unwrap().is_empty());

        objects.get_cached(&LookupCriteria::ByPrimaryKey(1)).await.unwrap();
        assert_eq!(table.lookups(), 3);
    }

    #[tokio::test]
    async fn test_cached_call_memoizes() {
        let (_, table, objects) = setup();
        let call = CallArgs::new();

        let store = objects.store().clone();
        let first: Vec<Record> = objects
            .cached_call("all", &call, || async move { store.fetch_all().await })
            .await
            .unwrap();
        let second: Vec<Record> = objects
            .cached_call("all", &call, || async {
                Err(CacheError::Internal("should be cached".to_string()))
            })
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(table.scans(), 1);
    }

    #[tokio::test]
    async fn test_namespace_key_follows_version() {
        let (_, _, objects) = setup();

        assert_eq!(objects.namespace_key(&["related", "7"]).await.unwrap(), "record:v0:ext:related:7");
        objects.invalidate().await.unwrap();
        assert_eq!(objects.namespace_key(&["related", "7"]).await.unwrap(), "record:v1:ext:related:7");
    }

    #[tokio::test]
    async fn test_namespace_key_cannot_reach_internal_slots() {
        let (_, _, objects) = setup();
        objects.get_cached(&LookupCriteria::ByPrimaryKey(1)).await.unwrap();

        let signature = LookupCriteria::<i64>::ByPrimaryKey(1).call_args().signature();
        let lookup = objects.lookup_key(&signature).await.unwrap();
        assert!(objects.backend().get(&lookup).await.unwrap().is_some());
        let related = objects.namespace_key(&["get_cached", ":pk=1"]).await.unwrap();
        assert_ne!(lookup, related);

        let slot = objects.namespace().key(&["__cached_signatures__"]).await.unwrap();
        assert_ne!(objects.namespace_key(&["__cached_signatures__"]).await.unwrap(), slot);
    }

    #[tokio::test]
    async fn test_warm_cache_is_a_no_op() {
        let (backend, table, objects) = setup();

        objects.warm_cache().await.unwrap();

        assert!(backend.is_empty().await);
        assert_eq!(table.scans(), 0);
    }
}
