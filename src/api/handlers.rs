//! API Handlers
//!
//! HTTP request handlers for each lookup service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::accessor::{CacheAccessor, TableCache};
use crate::cache::MemoryCache;
use crate::config::Config;
use crate::durable::MemoryTable;
use crate::error::Result;
use crate::keys::KeySpace;
use crate::model::LookupCriteria;
use crate::models::{HealthResponse, Record, StatsResponse, WarmResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Indexed accessor serving record lookups
    pub records: Arc<TableCache<Record>>,
    /// In-memory cache backend behind the accessor
    pub cache: MemoryCache,
    /// Durable record table
    pub table: Arc<MemoryTable<Record>>,
}

impl AppState {
    /// Wires an accessor over `table`, caching into `cache`.
    pub fn new(cache: MemoryCache, table: MemoryTable<Record>, key_prefix: &str) -> Self {
        let table = Arc::new(table);
        let keys = KeySpace::new(Arc::new(cache.clone()), key_prefix);
        Self {
            records: Arc::new(TableCache::new(keys, table.clone())),
            cache,
            table,
        }
    }

    /// Creates the state from configuration, loading the table file if one is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let table = match &config.table_path {
            Some(path) => MemoryTable::from_json_file(path)?,
            None => MemoryTable::new(Vec::new()),
        };
        let cache = MemoryCache::new(config.max_entries);
        Ok(Self::new(cache, table, &config.key_prefix))
    }
}

/// Handler for GET /records/:id
pub async fn get_record_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Record>> {
    let record = state
        .records
        .get_cached(&LookupCriteria::ByPrimaryKey(id))
        .await?;
    Ok(Json(record))
}

/// Handler for GET /records/by-slug/:slug
pub async fn get_record_by_slug_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Record>> {
    let record = state.records.get_cached(&LookupCriteria::BySlug(slug)).await?;
    Ok(Json(record))
}

/// Handler for POST /warm
///
/// Rebuilds the table index from the durable table.
pub async fn warm_handler(State(state): State<AppState>) -> Result<Json<WarmResponse>> {
    state.records.warm_cache().await?;
    let index = state.records.index().await?;
    Ok(Json(WarmResponse::new(index.len())))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.records.stats(),
        state.cache.len().await,
        state.cache.evictions().await,
        state.table.scans(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
