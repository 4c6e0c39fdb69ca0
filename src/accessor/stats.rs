//! Accessor Statistics Module
//!
//! Counters shared by every caller of one accessor.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Access Stats ==
/// Live counters, updated without locking.
#[derive(Debug, Default)]
pub struct AccessStats {
    hits: AtomicU64,
    misses: AtomicU64,
    not_found: AtomicU64,
    durable_lookups: AtomicU64,
    index_builds: AtomicU64,
}

impl AccessStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_durable_lookup(&self) {
        self.durable_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_index_build(&self) {
        self.index_builds.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            durable_lookups: self.durable_lookups.load(Ordering::Relaxed),
            index_builds: self.index_builds.load(Ordering::Relaxed),
        }
    }
}

// == Cache Stats ==
/// Snapshot of accessor counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache backend
    pub hits: u64,
    /// Lookups that had to be resolved from the index or durable store
    pub misses: u64,
    /// Misses that matched no record
    pub not_found: u64,
    /// Calls made to the durable store, single-record or full-table
    pub durable_lookups: u64,
    /// Times the in-memory table index was (re)built
    pub index_builds: u64,
}

impl CacheStats {
    /// hits / (hits + misses), or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_starts_empty() {
        let stats = AccessStats::new();
        assert_eq!(stats.snapshot(), CacheStats::default());
        assert_eq!(stats.snapshot().hit_rate(), 0.0);
    }

    #[test]
    fn test_counters() {
        let stats = AccessStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_not_found();
        stats.record_durable_lookup();
        stats.record_durable_lookup();
        stats.record_index_build();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.hits, 3);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.not_found, 1);
        assert_eq!(snapshot.durable_lookups, 2);
        assert_eq!(snapshot.index_builds, 1);
        assert!((snapshot.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
