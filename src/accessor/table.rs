//! Read-through accessor backed by an in-memory table index.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::accessor::{CacheAccessor, CacheStats, ObjectCache, TableIndex};
use crate::durable::DurableStore;
use crate::error::{CacheError, Result};
use crate::keys::{CallArgs, KeySpace};
use crate::model::{CacheModel, LookupCriteria};

/// Memoized method name of the full-table fetch.
const ALL: &str = "all";

/// Accessor for small tables looked up by primary key or slug.
///
/// The whole table is fetched once (itself a memoized call shared through
/// the backend) and indexed in memory; misses are resolved against the
/// index instead of the durable store. The index is built on first use or
/// by `warm_cache`, and does not see later writes until `warm_cache` or
/// `invalidate` rebuilds it.
pub struct TableCache<M: CacheModel> {
    objects: ObjectCache<M>,
    index: RwLock<Option<Arc<TableIndex<M>>>>,
    build: Mutex<()>,
}

impl<M: CacheModel> TableCache<M> {
    pub fn new(keys: KeySpace, store: Arc<dyn DurableStore<M>>) -> Self {
        Self::wrap(ObjectCache::new(keys, store))
    }

    /// Builds a table accessor around an existing object accessor.
    pub fn wrap(objects: ObjectCache<M>) -> Self {
        Self {
            objects,
            index: RwLock::new(None),
            build: Mutex::new(()),
        }
    }

    pub fn objects(&self) -> &ObjectCache<M> {
        &self.objects
    }

    /// Full table, memoized in the backend with no expiry.
    pub async fn all(&self) -> Result<Vec<M>> {
        let store = self.objects.store().clone();
        let stats = self.objects.access_stats();
        self.objects
            .cached_call(ALL, &CallArgs::new(), || async move {
                stats.record_durable_lookup();
                store.fetch_all().await
            })
            .await
    }

    /// Current index, building it first if needed.
    ///
    /// Concurrent callers share one build: whoever holds the build lock
    /// fetches, the rest wait and reuse its result.
    pub async fn index(&self) -> Result<Arc<TableIndex<M>>> {
        if let Some(index) = self.current().await {
            return Ok(index);
        }

        let _build = self.build.lock().await;
        if let Some(index) = self.current().await {
            return Ok(index);
        }

        let records = self.all().await?;
        Ok(self.install(records).await)
    }

    pub async fn is_built(&self) -> bool {
        self.index.read().await.is_some()
    }

    async fn current(&self) -> Option<Arc<TableIndex<M>>> {
        self.index.read().await.clone()
    }

    /// Re-reads the table from the durable store, refreshes the memoized
    /// full-table entry and swaps in a new index.
    ///
    /// Cached lookups are flushed once the new index is in place, so no
    /// entry resolved against the old snapshot outlives it.
    async fn rebuild(&self) -> Result<Arc<TableIndex<M>>> {
        let _build = self.build.lock().await;

        self.objects.access_stats().record_durable_lookup();
        let records = self.objects.store().fetch_all().await?;
        self.objects.replace_call(ALL, &CallArgs::new(), &records).await?;
        let index = self.install(records).await;

        self.objects.flush().await?;
        Ok(index)
    }

    /// Readers see either the old index or the complete new one.
    async fn install(&self, records: Vec<M>) -> Arc<TableIndex<M>> {
        let index = Arc::new(TableIndex::build(records));
        *self.index.write().await = Some(index.clone());

        self.objects.access_stats().record_index_build();
        info!(
            entity = M::MODEL_NAME,
            records = index.len(),
            slugs = index.slug_count(),
            "table index built"
        );
        index
    }
}

#[async_trait]
impl<M: CacheModel> CacheAccessor<M> for TableCache<M> {
    async fn get_cached(&self, criteria: &LookupCriteria<M::Pk>) -> Result<M> {
        let index = self.index().await?;
        self.objects
            .read_through(criteria, || async move {
                index
                    .get(criteria)
                    .cloned()
                    .ok_or_else(|| CacheError::NotFound(format!("{} {}", M::MODEL_NAME, criteria)))
            })
            .await
    }

    async fn warm_cache(&self) -> Result<()> {
        self.rebuild().await.map(|_| ())
    }

    async fn namespace_key(&self, parts: &[&str]) -> Result<String> {
        self.objects.namespace_key(parts).await
    }

    /// Bumps the namespace and rebuilds the index from the durable store.
    async fn invalidate(&self) -> Result<u64> {
        let version = self.objects.invalidate().await?;
        self.rebuild().await?;
        Ok(version)
    }

    fn stats(&self) -> CacheStats {
        self.objects.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::durable::MemoryTable;
    use crate::models::Record;

    fn setup() -> (Arc<MemoryTable<Record>>, Arc<TableCache<Record>>) {
        let table = Arc::new(MemoryTable::new(vec![
            Record::new(1, Some("a")),
            Record::new(2, Some("b")),
            Record::new(3, None),
        ]));
        let keys = KeySpace::new(Arc::new(MemoryCache::new(1000)), "");
        (table.clone(), Arc::new(TableCache::new(keys, table)))
    }

    #[tokio::test]
    async fn test_index_built_lazily_once() {
        let (table, cache) = setup();
        assert!(!cache.is_built().await);

        cache.get_cached(&LookupCriteria::ByPrimaryKey(1)).await.unwrap();
        cache.get_cached(&LookupCriteria::slug("b")).await.unwrap();

        assert!(cache.is_built().await);
        assert_eq!(table.scans(), 1);
        assert_eq!(table.lookups(), 0);
        assert_eq!(cache.stats().index_builds, 1);
        assert_eq!(cache.stats().durable_lookups, 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_lookups_build_once() {
        let (table, cache) = setup();

        let mut handles = Vec::new();
        for pk in [1, 2, 3, 1, 2, 3] {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.get_cached(&LookupCriteria::ByPrimaryKey(pk)).await.unwrap().id
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(table.scans(), 1);
        assert_eq!(cache.stats().index_builds, 1);
    }

    #[tokio::test]
    async fn test_fields_criteria_not_found() {
        let (_, cache) = setup();

        let result = cache.get_cached(&LookupCriteria::fields([("title", "x")])).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_pk_field_filter_agrees_with_pk_lookup() {
        let (_, cache) = setup();
        let filter = LookupCriteria::fields([("pk", 1)]);

        // Cold, then again once the pk lookup has filled the shared entry
        assert_eq!(cache.get_cached(&filter).await.unwrap().id, 1);
        cache.get_cached(&LookupCriteria::ByPrimaryKey(1)).await.unwrap();
        assert_eq!(cache.get_cached(&filter).await.unwrap().id, 1);

        let (_, fresh) = setup();
        fresh.get_cached(&LookupCriteria::ByPrimaryKey(2)).await.unwrap();
        assert_eq!(fresh.get_cached(&LookupCriteria::fields([("pk", 2)])).await.unwrap().id, 2);
        assert_eq!(fresh.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_slug_field_filter_resolves_through_index() {
        let (table, cache) = setup();

        let record = cache.get_cached(&LookupCriteria::fields([("slug", "b")])).await.unwrap();
        assert_eq!(record.id, 2);
        assert_eq!(table.lookups(), 0);
    }

    #[tokio::test]
    async fn test_index_is_stale_until_warmed() {
        let (table, cache) = setup();
        cache.warm_cache().await.unwrap();

        table.upsert(Record::new(4, Some("d"))).await;
        assert!(cache.get_cached(&LookupCriteria::ByPrimaryKey(4)).await.unwrap_err().is_not_found());

        cache.warm_cache().await.unwrap();
        assert_eq!(cache.get_cached(&LookupCriteria::ByPrimaryKey(4)).await.unwrap().id, 4);
        assert_eq!(table.scans(), 2);
    }

    #[tokio::test]
    async fn test_warm_drops_lookups_cached_from_old_index() {
        let (table, cache) = setup();
        let criteria = LookupCriteria::ByPrimaryKey(2);
        assert_eq!(cache.get_cached(&criteria).await.unwrap().slug.as_deref(), Some("b"));

        table.upsert(Record::new(2, Some("bee"))).await;
        cache.warm_cache().await.unwrap();

        let index = cache.index().await.unwrap();
        assert_eq!(index.by_pk(&2).and_then(|r| r.slug.as_deref()), Some("bee"));
        assert_eq!(cache.get_cached(&criteria).await.unwrap().slug.as_deref(), Some("bee"));
        assert_eq!(cache.get_cached(&LookupCriteria::slug("bee")).await.unwrap().id, 2);
        assert!(cache.get_cached(&LookupCriteria::slug("b")).await.unwrap_err().is_not_found());
        assert_eq!(cache.stats().durable_lookups, 2);
    }

    #[tokio::test]
    async fn test_memoized_table_shared_across_instances() {
        let table = Arc::new(MemoryTable::new(vec![Record::new(1, Some("a"))]));
        let keys = KeySpace::new(Arc::new(MemoryCache::new(1000)), "");
        let first = TableCache::new(keys.clone(), table.clone());
        let second = TableCache::new(keys, table.clone());

        first.get_cached(&LookupCriteria::ByPrimaryKey(1)).await.unwrap();
        second.get_cached(&LookupCriteria::slug("a")).await.unwrap();

        assert_eq!(table.scans(), 1);
        assert!(second.is_built().await);
    }

    #[tokio::test]
    async fn test_invalidate_rebuilds_from_store() {
        let (table, cache) = setup();
        let criteria = LookupCriteria::ByPrimaryKey(2);
        cache.get_cached(&criteria).await.unwrap();

        table.upsert(Record::new(2, Some("bee"))).await;
        assert_eq!(cache.get_cached(&criteria).await.unwrap().slug.as_deref(), Some("b"));

        assert_eq!(cache.invalidate().await.unwrap(), 1);
        assert_eq!(cache.get_cached(&criteria).await.unwrap().slug.as_deref(), Some("bee"));
        assert_eq!(cache.get_cached(&LookupCriteria::slug("bee")).await.unwrap().id, 2);
    }
}
