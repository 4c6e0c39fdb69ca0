//! Cache Store Module
//!
//! Synchronous key-value engine behind the in-memory backend: HashMap storage
//! with expiry deadlines and LRU eviction at capacity.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::{parse_counter, CacheEntry, Expiry, LruTracker, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};

// == Cache Store ==
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
    max_entries: usize,
    evictions: u64,
}

impl CacheStore {
    /// Creates an empty store holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            max_entries: max_entries.max(1),
            evictions: 0,
        }
    }

    // == Set ==
    /// Stores a value, overwriting any previous one and resetting its expiry.
    ///
    /// When the store is full and `key` is new, the least recently used
    /// entry is evicted first.
    pub fn set(&mut self, key: &str, value: String, expiry: Expiry) -> Result<()> {
        validate_key(key)?;
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            let evicted = self.lru.evict_oldest().ok_or_else(|| {
                CacheError::Internal("Cache is full and eviction failed".to_string())
            })?;
            self.entries.remove(&evicted);
            self.evictions += 1;
            debug!(key = %evicted, "evicted least recently used entry");
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(value, expiry));
        self.lru.touch(key);
        Ok(())
    }

    // == Get ==
    /// Returns the live value for `key`; expired entries are dropped and read as absent.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let expired = self.entries.get(key)?.is_expired();
        if expired {
            self.remove(key);
            return None;
        }

        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Delete ==
    /// Removes `key`, returning whether a live entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.remove(key) {
            Some(entry) => !entry.is_expired(),
            None => false,
        }
    }

    // == Increment ==
    /// Adds one to the integer stored at `key` and returns the new value.
    ///
    /// A missing key starts from zero and is stored without expiry; an
    /// existing key keeps its deadline.
    pub fn incr(&mut self, key: &str) -> Result<u64> {
        validate_key(key)?;
        let current = match self.get(key) {
            Some(raw) => parse_counter(key, &raw)?,
            None => 0,
        };
        let next = current + 1;

        match self.entries.get_mut(key) {
            Some(entry) => entry.value = next.to_string(),
            None => self.set(key, next.to_string(), Expiry::Forever)?,
        }
        Ok(next)
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = chrono::Utc::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries evicted to make room since creation.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.lru.remove(key);
        self.entries.remove(key)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
