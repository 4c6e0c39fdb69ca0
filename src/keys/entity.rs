//! Per-entity cache namespace
//!
//! Owns the namespace base for one record type and the set of call
//! signatures cached under it.

use std::collections::BTreeSet;

use tracing::debug;

use crate::cache::Expiry;
use crate::error::Result;
use crate::keys::{CallArgs, KeySpace, Signature};

const SIGNATURES_SLOT: &str = "__cached_signatures__";

/// Cache namespace of a single entity type.
///
/// Cheap to clone; all state lives in the backend.
#[derive(Clone)]
pub struct EntityNamespace {
    keys: KeySpace,
    base: String,
}

impl EntityNamespace {
    pub fn new(keys: KeySpace, base: impl Into<String>) -> Self {
        Self {
            keys,
            base: base.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn key_space(&self) -> &KeySpace {
        &self.keys
    }

    /// Key for `parts` under the namespace's current version.
    pub async fn key<S: AsRef<str>>(&self, parts: &[S]) -> Result<String> {
        self.keys.derive_key(&self.base, parts).await
    }

    pub async fn version(&self) -> Result<u64> {
        self.keys.version(&self.base).await
    }

    /// Invalidates every key derived so far for this entity type.
    pub async fn bump(&self) -> Result<u64> {
        self.keys.bump(&self.base).await
    }

    /// Renders the signature of `call` and records it in the signature set.
    ///
    /// The set update is a read-modify-write: concurrent registrations can
    /// drop each other's additions. A lost entry only means a later `flush`
    /// will not delete that one cached call directly.
    pub async fn generate_signature(&self, call: &CallArgs) -> Result<Signature> {
        let signature = call.signature();

        let slot = self.signatures_key().await?;
        let mut known = self.read_signatures(&slot).await?;
        if known.insert(signature.clone()) {
            debug!(entity = %self.base, %signature, "registered call signature");
            self.write_signatures(&slot, &known).await?;
        }

        Ok(signature)
    }

    /// Every signature registered under the current version.
    pub async fn signatures(&self) -> Result<BTreeSet<Signature>> {
        let slot = self.signatures_key().await?;
        self.read_signatures(&slot).await
    }

    /// Replaces the signature set with an empty one.
    pub async fn clear_signatures(&self) -> Result<()> {
        let slot = self.signatures_key().await?;
        self.write_signatures(&slot, &BTreeSet::new()).await
    }

    async fn signatures_key(&self) -> Result<String> {
        self.key(&[SIGNATURES_SLOT]).await
    }

    async fn read_signatures(&self, slot: &str) -> Result<BTreeSet<Signature>> {
        match self.keys.backend().get(slot).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(BTreeSet::new()),
        }
    }

    async fn write_signatures(&self, slot: &str, set: &BTreeSet<Signature>) -> Result<()> {
        let raw = serde_json::to_string(set)?;
        self.keys.backend().set(slot, raw, Expiry::Forever).await
    }
}
