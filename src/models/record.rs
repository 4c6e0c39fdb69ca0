//! Record model served by the lookup service
//!
//! A generic row: integer primary key, optional slug, and any other columns
//! kept as free-form JSON fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::CacheModel;

/// A single table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key
    pub id: i64,
    /// Secondary unique key, absent for rows without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Remaining columns
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: i64, slug: Option<&str>) -> Self {
        Self {
            id,
            slug: slug.map(str::to_string),
            fields: Map::new(),
        }
    }

    /// Adds or replaces a column value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

impl CacheModel for Record {
    type Pk = i64;

    const MODEL_NAME: &'static str = "record";

    fn pk(&self) -> i64 {
        self.id
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }
}
