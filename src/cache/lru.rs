//! LRU Tracker Module
//!
//! Orders keys by last access so the in-memory backend can evict when full.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks access recency with a monotonically increasing tick.
///
/// `ticks` maps key -> last tick, `order` maps tick -> key; the smallest tick
/// in `order` is the least recently used key.
#[derive(Debug, Default)]
pub struct LruTracker {
    next_tick: u64,
    ticks: HashMap<String, u64>,
    order: BTreeMap<u64, String>,
}

impl LruTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a key as most recently used.
    pub fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;

        match self.ticks.get_mut(key) {
            Some(previous) => {
                self.order.remove(&*previous);
                *previous = tick;
            }
            None => {
                self.ticks.insert(key.to_string(), tick);
            }
        }
        self.order.insert(tick, key.to_string());
    }

    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    /// Removes and returns the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}
