//! cachemodel - namespaced read-through record caching
//!
//! Caches single-record lookups per call signature, invalidates whole entity
//! namespaces by bumping a version, and serves small tables from an
//! in-memory index by primary key and slug.

pub mod accessor;
pub mod api;
pub mod cache;
pub mod config;
pub mod durable;
pub mod error;
pub mod keys;
pub mod model;
pub mod models;
pub mod tasks;

pub use accessor::{CacheAccessor, CacheStats, ObjectCache, TableCache, TableIndex};
pub use api::AppState;
pub use cache::{CacheBackend, Expiry, MemoryCache};
pub use config::Config;
pub use durable::{DurableStore, MemoryTable};
pub use error::{CacheError, Result};
pub use keys::{CallArgs, EntityNamespace, KeySpace, Signature};
pub use model::{CacheModel, LookupCriteria};
pub use tasks::spawn_cleanup_task;
