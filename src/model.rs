//! Cacheable records and lookup criteria.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{de::DeserializeOwned, Serialize};

use crate::keys::CallArgs;

/// A record type whose copies may be cached.
///
/// Cached copies are serialized projections of the durable record and have
/// no lifecycle of their own.
pub trait CacheModel: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Primary key type. `FromStr` reads it back out of a field filter.
    type Pk: Clone + Eq + Hash + fmt::Display + fmt::Debug + FromStr + Send + Sync + 'static;

    /// Namespace base shared by every cache key of this type.
    const MODEL_NAME: &'static str;

    fn pk(&self) -> Self::Pk;

    /// Secondary unique key, if the type has one.
    fn slug(&self) -> Option<&str> {
        None
    }
}

/// How a single record is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupCriteria<K> {
    ByPrimaryKey(K),
    BySlug(String),
    /// Field equality filter. Indexed accessors only honour its `pk` or
    /// `slug` entry.
    Fields(BTreeMap<String, String>),
}

impl<K: fmt::Display> LookupCriteria<K> {
    pub fn slug(slug: impl Into<String>) -> Self {
        LookupCriteria::BySlug(slug.into())
    }

    /// Builds a `Fields` filter from `(name, value)` pairs.
    pub fn fields<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: fmt::Display,
    {
        LookupCriteria::Fields(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.to_string()))
                .collect(),
        )
    }

    /// Keyword form used for signatures: `pk=`, `slug=` or the filter fields.
    pub fn call_args(&self) -> CallArgs {
        match self {
            LookupCriteria::ByPrimaryKey(pk) => CallArgs::new().kwarg("pk", pk),
            LookupCriteria::BySlug(slug) => CallArgs::new().kwarg("slug", slug),
            LookupCriteria::Fields(fields) => fields.iter().collect(),
        }
    }
}

impl<K: fmt::Display> fmt::Display for LookupCriteria<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.call_args().signature().as_str())
    }
}
