//! Durable Store Module
//!
//! The source of truth behind the cache, and an in-memory table that
//! implements it.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{CacheError, Result};
use crate::model::{CacheModel, LookupCriteria};

/// Persistent record storage consulted on cache misses.
#[async_trait]
pub trait DurableStore<M: CacheModel>: Send + Sync {
    /// Returns the single record matching `criteria`.
    ///
    /// Fails with `NotFound` when nothing matches and `MultipleFound` when
    /// more than one record does.
    async fn fetch_one(&self, criteria: &LookupCriteria<M::Pk>) -> Result<M>;

    /// Full ordered scan of the table.
    async fn fetch_all(&self) -> Result<Vec<M>>;
}

// == Memory Table ==
/// Durable store over an in-memory vector, kept in insertion order.
///
/// Counts `fetch_one` and `fetch_all` calls so callers can observe how often
/// the cache fell through.
#[derive(Debug)]
pub struct MemoryTable<M> {
    rows: RwLock<Vec<M>>,
    lookups: AtomicU64,
    scans: AtomicU64,
}

impl<M: CacheModel> MemoryTable<M> {
    pub fn new(rows: Vec<M>) -> Self {
        Self {
            rows: RwLock::new(rows),
            lookups: AtomicU64::new(0),
            scans: AtomicU64::new(0),
        }
    }

    /// Loads rows from a JSON array file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CacheError::Backend(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let rows: Vec<M> = serde_json::from_str(&raw)?;
        info!(path = %path.display(), rows = rows.len(), "loaded table");
        Ok(Self::new(rows))
    }

    /// Inserts a new row or replaces the row with the same primary key.
    pub async fn upsert(&self, record: M) {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|row| row.pk() == record.pk()) {
            Some(row) => *row = record,
            None => rows.push(record),
        }
    }

    /// Deletes the row with primary key `pk`, returning whether it existed.
    pub async fn remove(&self, pk: &M::Pk) -> bool {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| &row.pk() != pk);
        rows.len() != before
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Number of `fetch_one` calls served.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Number of `fetch_all` calls served.
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl<M: CacheModel> DurableStore<M> for MemoryTable<M> {
    async fn fetch_one(&self, criteria: &LookupCriteria<M::Pk>) -> Result<M> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let rows = self.rows.read().await;

        let mut found = Vec::new();
        for row in rows.iter() {
            if matches(row, criteria)? {
                found.push(row);
            }
        }

        match found.as_slice() {
            [] => Err(CacheError::NotFound(format!("{} {}", M::MODEL_NAME, criteria))),
            [row] => Ok((*row).clone()),
            _ => Err(CacheError::MultipleFound(format!(
                "{} {} matched {} rows",
                M::MODEL_NAME,
                criteria,
                found.len()
            ))),
        }
    }

    async fn fetch_all(&self) -> Result<Vec<M>> {
        self.scans.fetch_add(1, Ordering::Relaxed);
        Ok(self.rows.read().await.clone())
    }
}

fn matches<M: CacheModel>(row: &M, criteria: &LookupCriteria<M::Pk>) -> Result<bool> {
    match criteria {
        LookupCriteria::ByPrimaryKey(pk) => Ok(&row.pk() == pk),
        LookupCriteria::BySlug(slug) => Ok(row.slug() == Some(slug.as_str())),
        LookupCriteria::Fields(fields) => {
            let value = serde_json::to_value(row)?;
            Ok(fields
                .iter()
                .all(|(name, expected)| field_text(row, &value, name).as_deref() == Some(expected)))
        }
    }
}

/// Text form of a field for equality filters; `pk` and `slug` use the model accessors.
fn field_text<M: CacheModel>(row: &M, value: &Value, name: &str) -> Option<String> {
    match name {
        "pk" => Some(row.pk().to_string()),
        "slug" => row.slug().map(str::to_string),
        _ => match value.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        },
    }
}
