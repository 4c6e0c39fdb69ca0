//! Response DTOs for the lookup service
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::accessor::CacheStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Lookups answered from the cache backend
    pub hits: u64,
    /// Lookups resolved from the table index
    pub misses: u64,
    /// Lookups that matched no record
    pub not_found: u64,
    /// Calls made to the durable store
    pub durable_lookups: u64,
    /// Table index builds since start
    pub index_builds: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Entries currently held by the cache backend
    pub cache_entries: usize,
    /// Entries the backend evicted to stay within capacity
    pub evictions: u64,
    /// Full-table scans served by the durable store
    pub table_scans: u64,
}

impl StatsResponse {
    /// Combines accessor counters with backend and table figures.
    pub fn new(stats: CacheStats, cache_entries: usize, evictions: u64, table_scans: u64) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            not_found: stats.not_found,
            durable_lookups: stats.durable_lookups,
            index_builds: stats.index_builds,
            hit_rate: stats.hit_rate(),
            cache_entries,
            evictions,
            table_scans,
        }
    }
}

/// Response body for the warm-up endpoint (POST /warm)
#[derive(Debug, Clone, Serialize)]
pub struct WarmResponse {
    /// Success message
    pub message: String,
    /// Records in the rebuilt index
    pub records: usize,
}

impl WarmResponse {
    pub fn new(records: usize) -> Self {
        Self {
            message: format!("Indexed {} records", records),
            records,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
