//! Versioned key namespaces
//!
//! Every namespace has a version counter stored in the backend. Derived keys
//! embed the current version, so bumping it makes every older key
//! unreachable at once. Nothing is deleted; stale entries are left to the
//! backend's own expiry and eviction.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::cache::{parse_counter, CacheBackend, MAX_KEY_LENGTH};
use crate::error::Result;

const VERSION_MARKER: &str = "__ns__";
const PART_SEPARATOR: &str = ":";
const DIGEST_MARKER: char = '#';

/// Allocates namespace-qualified keys against one backend.
///
/// If the backend drops a version counter (eviction, restart), the namespace
/// silently restarts at version 0 and may resurface entries written under
/// that version.
#[derive(Clone)]
pub struct KeySpace {
    backend: Arc<dyn CacheBackend>,
    prefix: String,
}

impl KeySpace {
    /// `prefix` is prepended to every key this space produces.
    pub fn new(backend: Arc<dyn CacheBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Current version of `base`; 0 until the first bump.
    ///
    /// A counter holding anything but an integer is an error, the same as
    /// for `bump`.
    pub async fn version(&self, base: &str) -> Result<u64> {
        let key = self.version_key(base);
        match self.backend.get(&key).await? {
            Some(raw) => parse_counter(&key, &raw),
            None => Ok(0),
        }
    }

    /// Builds `<prefix><base>:v<version>:<parts...>` for the current version.
    pub async fn derive_key<S: AsRef<str>>(&self, base: &str, parts: &[S]) -> Result<String> {
        let version = self.version(base).await?;
        let key = versioned_key(&self.prefix, base, version, parts);
        debug!(%key, "derived namespace key");
        Ok(key)
    }

    /// Moves `base` to its next version and returns it.
    pub async fn bump(&self, base: &str) -> Result<u64> {
        let version = self.backend.incr(&self.version_key(base)).await?;
        info!(namespace = base, version, "namespace version bumped");
        Ok(version)
    }

    fn version_key(&self, base: &str) -> String {
        compact(
            format!("{}{}{}", self.prefix, VERSION_MARKER, PART_SEPARATOR),
            base,
        )
    }
}

fn versioned_key<S: AsRef<str>>(prefix: &str, base: &str, version: u64, parts: &[S]) -> String {
    let head = format!("{}{}{}v{}{}", prefix, base, PART_SEPARATOR, version, PART_SEPARATOR);
    let tail = parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(PART_SEPARATOR);
    compact(head, &tail)
}

/// Joins `head` and `tail`, replacing the tail by its SHA-256 digest when the
/// key would exceed the backend limit (and the whole key if the head alone
/// is already too long).
fn compact(head: String, tail: &str) -> String {
    if head.len() + tail.len() <= MAX_KEY_LENGTH {
        return head + tail;
    }

    let digest_len = 1 + Sha256::output_size() * 2;
    if head.len() + digest_len <= MAX_KEY_LENGTH {
        format!("{}{}{}", head, DIGEST_MARKER, hex::encode(Sha256::digest(tail.as_bytes())))
    } else {
        let full = head + tail;
        format!("{}{}", DIGEST_MARKER, hex::encode(Sha256::digest(full.as_bytes())))
    }
}
