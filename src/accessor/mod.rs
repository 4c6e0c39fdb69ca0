//! Accessor Module
//!
//! Read-through accessors over a durable store. `ObjectCache` resolves misses
//! with the durable store; `TableCache` composes an `ObjectCache` with an
//! in-memory index of the whole table.
//!
//! # Key layout
//! Every key lives in the entity's versioned namespace
//! (`<prefix><model>:v<version>:...`):
//! - `get_cached:<signature>` - one cached lookup
//! - `method:<name>:<signature>` - a memoized call such as the full table
//! - `__cached_signatures__` - the set of lookup signatures
//! - `ext:<parts>` - keys handed out by `namespace_key`

mod index;
mod object;
mod stats;
mod table;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{CacheModel, LookupCriteria};

pub use index::TableIndex;
pub use object::ObjectCache;
pub use stats::{AccessStats, CacheStats};
pub use table::TableCache;

/// Uniform interface of the record accessors.
#[async_trait]
pub trait CacheAccessor<M: CacheModel>: Send + Sync {
    /// Returns the record matching `criteria`, fails with `NotFound`.
    async fn get_cached(&self, criteria: &LookupCriteria<M::Pk>) -> Result<M>;

    /// Eagerly prepares the accessor; a no-op unless it keeps an index.
    async fn warm_cache(&self) -> Result<()>;

    /// Key inside this entity's namespace, for related caches that want to
    /// be invalidated together with it. Always under the `ext` part, so it
    /// never names one of the accessor's own entries.
    async fn namespace_key(&self, parts: &[&str]) -> Result<String>;

    /// Invalidates everything cached for the entity type and returns the new
    /// namespace version.
    async fn invalidate(&self) -> Result<u64>;

    fn stats(&self) -> CacheStats;
}
