//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the in-memory store against a simple model.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::cache::{CacheBackend, CacheStore, Expiry, MemoryCache};

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,3}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}"
}

#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    Incr { key: String },
}

fn op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| StoreOp::Set { key, value }),
        key_strategy().prop_map(|key| StoreOp::Get { key }),
        key_strategy().prop_map(|key| StoreOp::Delete { key }),
        key_strategy().prop_map(|key| StoreOp::Incr { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // With room for every key, the store behaves like a plain map.
    #[test]
    fn prop_unbounded_store_matches_map(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut store = CacheStore::new(usize::MAX);
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    store.set(&key, value.clone(), Expiry::Forever).unwrap();
                    model.insert(key, value);
                }
                StoreOp::Get { key } => {
                    prop_assert_eq!(store.get(&key), model.get(&key).cloned());
                }
                StoreOp::Delete { key } => {
                    prop_assert_eq!(store.delete(&key), model.remove(&key).is_some());
                }
                StoreOp::Incr { key } => {
                    let expected = match model.get(&key) {
                        Some(raw) => raw.parse::<u64>().ok().map(|n| n + 1),
                        None => Some(1),
                    };
                    match expected {
                        Some(next) => {
                            prop_assert_eq!(store.incr(&key).unwrap(), next);
                            model.insert(key, next.to_string());
                        }
                        None => prop_assert!(store.incr(&key).is_err()),
                    }
                }
            }
        }

        prop_assert_eq!(store.len(), model.len());
    }

    // The number of entries never exceeds capacity.
    #[test]
    fn prop_capacity_enforced(
        capacity in 1usize..8,
        keys in prop::collection::vec(key_strategy(), 1..80)
    ) {
        let mut store = CacheStore::new(capacity);

        for key in keys {
            store.set(&key, "v".to_string(), Expiry::Forever).unwrap();
            prop_assert!(store.len() <= capacity);
            prop_assert!(store.get(&key).is_some(), "just-written key must be readable");
        }
    }

    // Version counters only move forward.
    #[test]
    fn prop_incr_is_monotonic(count in 1u64..40) {
        let cache = MemoryCache::new(10);
        let mut last = 0;

        for _ in 0..count {
            let next = tokio_test::block_on(cache.incr("ns")).unwrap();
            prop_assert!(next > last);
            last = next;
        }
        prop_assert_eq!(last, count);
    }
}
