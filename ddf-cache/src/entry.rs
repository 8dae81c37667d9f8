//! Cached product entries and their validity against the current metacard.

use chrono::{DateTime, Utc};
use ddf_core::{ContentHash, Metacard, MetacardId};
use serde::{Deserialize, Serialize};

use crate::key::CacheKey;

/// Snapshot of the metacard a product was cached against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetacardFingerprint {
    pub metacard_id: MetacardId,
    pub content_hash: ContentHash,
    pub modified: Option<DateTime<Utc>>,
    pub checksum: Option<String>,
}

impl MetacardFingerprint {
    pub fn of(metacard: &Metacard) -> Self {
        Self {
            metacard_id: metacard.id.clone(),
            content_hash: metacard.content_hash(),
            modified: metacard.modified(),
            checksum: metacard.checksum().map(str::to_string),
        }
    }
}

/// Outcome of checking a cached entry against the current metacard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    /// The entry belongs to a different metacard.
    WrongMetacard,
    /// The metacard changed after the product was cached.
    MetacardChanged,
    /// The stored bytes do not match the recorded size.
    SizeMismatch,
}

impl Validity {
    pub fn is_valid(self) -> bool {
        matches!(self, Validity::Valid)
    }
}

/// A cached product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResource {
    pub key: CacheKey,
    pub source_id: Option<String>,
    pub fingerprint: MetacardFingerprint,
    pub mime_type: String,
    pub size: u64,
    pub content: Vec<u8>,
    pub cached_at: DateTime<Utc>,
}

impl CachedResource {
    /// Cache `content` as the product identified by `key`, pinned to `metacard`.
    pub fn new(key: CacheKey, metacard: &Metacard, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            key,
            source_id: metacard.source_id.clone(),
            fingerprint: MetacardFingerprint::of(metacard),
            mime_type: mime_type.into(),
            size: content.len() as u64,
            content,
            cached_at: Utc::now(),
        }
    }

    pub fn metacard_id(&self) -> &str {
        &self.fingerprint.metacard_id
    }

    /// Check this entry against the current state of its metacard.
    pub fn validity(&self, current: &Metacard) -> Validity {
        if self.fingerprint.metacard_id != current.id || self.source_id != current.source_id {
            return Validity::WrongMetacard;
        }
        if self.fingerprint.content_hash != current.content_hash() {
            return Validity::MetacardChanged;
        }
        if self.content.len() as u64 != self.size {
            return Validity::SizeMismatch;
        }
        Validity::Valid
    }

    pub fn is_valid_for(&self, current: &Metacard) -> bool {
        self.validity(current).is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(metacard: &Metacard) -> CachedResource {
        let key = CacheKey::for_metacard(metacard).unwrap();
        CachedResource::new(key, metacard, "text/plain", b"product".to_vec())
    }

    #[test]
    fn test_fresh_entry_is_valid() {
        let metacard = Metacard::new("abc").with_attribute("title", ["Report"]);
        let entry = cached(&metacard);
        assert_eq!(entry.size, 7);
        assert_eq!(entry.metacard_id(), "abc");
        assert_eq!(entry.validity(&metacard), Validity::Valid);
    }

    #[test]
    fn test_changed_metacard_makes_entry_stale() {
        let metacard = Metacard::new("abc").with_attribute("title", ["Report"]);
        let entry = cached(&metacard);
        let updated = metacard.with_attribute("title", ["Report v2"]);
        assert_eq!(entry.validity(&updated), Validity::MetacardChanged);
        assert!(!entry.is_valid_for(&updated));
    }

    #[test]
    fn test_far_future_modified_change_makes_entry_stale() {
        use chrono::TimeZone;
        use ddf_core::core_attributes;

        let at = |year| {
            Metacard::new("abc").with_attribute(
                core_attributes::MODIFIED,
                [Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()],
            )
        };
        let entry = cached(&at(2300));
        assert_eq!(entry.validity(&at(2300)), Validity::Valid);
        assert_eq!(entry.validity(&at(2400)), Validity::MetacardChanged);
    }

    #[test]
    fn test_other_metacard_is_rejected() {
        let entry = cached(&Metacard::new("abc"));
        assert_eq!(entry.validity(&Metacard::new("def")), Validity::WrongMetacard);
        assert_eq!(
            entry.validity(&Metacard::new("abc").with_source("remote")),
            Validity::WrongMetacard
        );
    }

    #[test]
    fn test_truncated_content_is_rejected() {
        let metacard = Metacard::new("abc");
        let mut entry = cached(&metacard);
        entry.content.truncate(3);
        assert_eq!(entry.validity(&metacard), Validity::SizeMismatch);
    }
}
