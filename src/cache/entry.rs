//! Cache Entry Module
//!
//! Defines stored entries and the expiry policy callers attach to them.

use std::time::Duration;

use chrono::{DateTime, Utc};

// == Expiry ==
/// How long a value stays readable once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Never expires; only eviction or an explicit delete removes it.
    #[default]
    Forever,
    /// Expires once the duration has elapsed after the write.
    After(Duration),
}

impl Expiry {
    /// Shorthand for `Expiry::After` in whole seconds.
    pub fn seconds(secs: u64) -> Self {
        Expiry::After(Duration::from_secs(secs))
    }

    fn deadline_from(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Expiry::Forever => None,
            // Durations too large for chrono are treated as unbounded
            Expiry::After(ttl) => chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| now.checked_add_signed(ttl)),
        }
    }
}

// == Cache Entry ==
/// A single stored value with its write time and optional deadline.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// When the value was written
    pub created_at: DateTime<Utc>,
    /// When the value stops being readable, None = never
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Creates a new entry expiring according to `expiry`.
    pub fn new(value: String, expiry: Expiry) -> Self {
        let now = Utc::now();
        Self {
            value,
            created_at: now,
            expires_at: expiry.deadline_from(now),
        }
    }

    /// An entry is expired once the current time reaches its deadline.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }

    /// Remaining lifetime, `Some(Duration::ZERO)` once expired, None if unbounded.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at.map(|deadline| {
            (deadline - Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO)
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_forever_never_expires() {
        let entry = CacheEntry::new("v".to_string(), Expiry::Forever);

        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
        assert!(entry.ttl_remaining().is_none());
    }

    #[test]
    fn test_entry_with_ttl() {
        let entry = CacheEntry::new("v".to_string(), Expiry::seconds(60));

        assert!(entry.expires_at.is_some());
        assert!(!entry.is_expired());
        let remaining = entry.ttl_remaining().unwrap();
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining >= Duration::from_secs(59));
    }

    #[test]
    fn test_entry_expired_at_deadline() {
        let now = Utc::now();
        let entry = CacheEntry {
            value: "v".to_string(),
            created_at: now,
            expires_at: Some(now),
        };

        assert!(entry.is_expired_at(now));
        assert_eq!(entry.ttl_remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_huge_ttl_is_unbounded() {
        let entry = CacheEntry::new("v".to_string(), Expiry::After(Duration::MAX));
        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_default_expiry_is_forever() {
        assert_eq!(Expiry::default(), Expiry::Forever);
    }
}
