//! Deterministic cache keys for product variants.
//!
//! A key identifies one rendition of one product: the owning metacard (source
//! and id) plus the request options that select the variant. Options are held
//! in a `BTreeMap`, so the order they were supplied in never matters.
//!
//! # Encoding
//!
//! The key is the lowercase hex SHA-256 of a length-prefixed encoding:
//!
//! - source id presence byte, then `[len: u64 BE][bytes]` when present
//! - `[len][metacard id]`
//! - option count as u64 BE, then `[len][key][len][value]` per option in key order
//!
//! Length prefixes make the encoding injective, so two different inputs can
//! only share a key through a SHA-256 collision (about 2^-128 under the
//! birthday bound). The request target (by id or by URI) is not encoded:
//! both address the same product.

use std::fmt;

use ddf_core::{DdfError, DdfResult, Metacard, ResourceRequest};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of the hex form of a key.
pub const KEY_LENGTH: usize = 64;

/// Fingerprint identifying a cached product variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build the key for `request` against `metacard`.
    ///
    /// Fails only when the metacard id is blank.
    pub fn build(metacard: &Metacard, request: &ResourceRequest) -> DdfResult<Self> {
        if metacard.has_blank_id() {
            return Err(DdfError::missing("metacard.id"));
        }

        let mut hasher = Sha256::new();
        match metacard.source_id.as_deref() {
            Some(source) => {
                hasher.update([1u8]);
                feed(&mut hasher, source);
            }
            None => hasher.update([0u8]),
        }
        feed(&mut hasher, &metacard.id);
        hasher.update((request.options.len() as u64).to_be_bytes());
        for (key, value) in &request.options {
            feed(&mut hasher, key);
            feed(&mut hasher, value);
        }

        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Key for the default (option-less) request of `metacard`.
    pub fn for_metacard(metacard: &Metacard) -> DdfResult<Self> {
        Self::build(metacard, &ResourceRequest::by_id(metacard.id.clone()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn feed(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}
