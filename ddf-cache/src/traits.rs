//! Cache store and download manager traits.
//!
//! The store is the physical product cache (Solr- or disk-backed in a full
//! deployment). It owns its own locking; this crate only asks it validity
//! questions.

use ddf_core::{DdfResult, Metacard};
use serde::{Deserialize, Serialize};

use crate::entry::CachedResource;
use crate::key::CacheKey;

/// Product cache store.
///
/// Implementations must be thread-safe. An `Err` means the store itself
/// failed (unreachable, corrupt); a miss or a stale entry is `Ok(None)` /
/// `Ok(false)`.
pub trait ResourceCacheStore: Send + Sync {
    /// The entry under `key` if it is still valid for `metacard`.
    ///
    /// Implementations may drop a stale entry as a side effect.
    fn get_valid(&self, key: &CacheKey, metacard: &Metacard) -> DdfResult<Option<CachedResource>>;

    /// Whether a valid entry exists, without materializing it.
    fn contains_valid(&self, key: &CacheKey, metacard: &Metacard) -> DdfResult<bool>;

    /// Store or replace an entry.
    fn put(&self, resource: CachedResource) -> DdfResult<()>;

    /// Remove an entry. Returns whether anything was removed.
    fn remove(&self, key: &CacheKey) -> DdfResult<bool>;

    /// Remove every entry. Returns the number removed.
    fn clear(&self) -> DdfResult<u64>;

    /// Usage statistics.
    fn stats(&self) -> DdfResult<CacheStats>;
}

/// Holder of the product caching switch.
pub trait DownloadManager: Send + Sync {
    fn is_cache_enabled(&self) -> bool;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of valid lookups.
    pub hits: u64,
    /// Number of lookups with no entry.
    pub misses: u64,
    /// Number of lookups that found an entry but rejected it as stale.
    pub stale: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Bytes of cached product content.
    pub content_bytes: u64,
    /// Number of evictions due to capacity or staleness.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0). Stale lookups count as misses.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.stale;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
