//! Cache Module
//!
//! The backend seam the caching layer writes through, plus an in-memory
//! backend with expiry and LRU eviction.

mod backend;
mod entry;
mod lru;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use backend::{CacheBackend, MemoryCache};
pub use entry::{CacheEntry, Expiry};
pub use lru::LruTracker;
pub use store::CacheStore;

use crate::error::{CacheError, Result};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Parses a stored counter; anything but an unsigned integer is refused.
pub(crate) fn parse_counter(key: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| CacheError::InvalidRequest(format!("Value at '{}' is not an integer", key)))
}
