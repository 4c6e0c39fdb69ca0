//! Expiry Cleanup Task
//!
//! Background task that periodically removes expired entries from the
//! in-memory cache backend.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::MemoryCache;

/// Spawns a background task that sweeps expired entries every
/// `cleanup_interval_secs` seconds (at least one).
///
/// Entries cached with `Expiry::Forever` are never touched. The returned
/// handle is aborted during graceful shutdown.
pub fn spawn_cleanup_task(cache: MemoryCache, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired().await;
            if removed > 0 {
                info!("Expiry cleanup: removed {} expired entries", removed);
            } else {
                debug!("Expiry cleanup: no expired entries found");
            }
        }
    })
}
