//! In-memory product cache store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use ddf_core::{CacheError, CacheSettings, DdfResult, Metacard};
use tracing::debug;

use crate::entry::{CachedResource, Validity};
use crate::key::CacheKey;
use crate::traits::{CacheStats, ResourceCacheStore};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<CacheKey, CachedResource>,
    stats: CacheStats,
}

impl Inner {
    fn remove_entry(&mut self, key: &CacheKey) -> Option<CachedResource> {
        let removed = self.entries.remove(key)?;
        self.stats.content_bytes = self.stats.content_bytes.saturating_sub(removed.content.len() as u64);
        self.stats.entry_count = self.entries.len() as u64;
        Some(removed)
    }

    /// Look up `key`, dropping the entry when it is stale for `metacard`.
    fn check(&mut self, key: &CacheKey, metacard: &Metacard) -> bool {
        let Some(validity) = self.entries.get(key).map(|entry| entry.validity(metacard)) else {
            self.stats.misses += 1;
            return false;
        };
        if validity == Validity::Valid {
            self.stats.hits += 1;
            return true;
        }
        debug!(key = %key, metacard_id = %metacard.id, ?validity, "Dropping stale cache entry");
        self.stats.stale += 1;
        self.stats.evictions += 1;
        self.remove_entry(key);
        false
    }
}

/// Product cache held in process memory.
///
/// Stale entries are dropped when a lookup finds them. When `max_entries` is
/// reached the oldest entry is evicted to make room.
#[derive(Debug)]
pub struct InMemoryResourceCache {
    inner: Mutex<Inner>,
    max_entries: usize,
}

impl Default for InMemoryResourceCache {
    fn default() -> Self {
        Self::new(CacheSettings::default().max_entries)
    }
}

impl InMemoryResourceCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_entries: max_entries.max(1),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.max_entries)
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw entry lookup with no validity check.
    pub fn peek(&self, key: &CacheKey) -> DdfResult<Option<CachedResource>> {
        Ok(self.lock()?.entries.get(key).cloned())
    }

    fn lock(&self) -> DdfResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| CacheError::LockPoisoned.into())
    }
}

impl ResourceCacheStore for InMemoryResourceCache {
    fn get_valid(&self, key: &CacheKey, metacard: &Metacard) -> DdfResult<Option<CachedResource>> {
        let mut inner = self.lock()?;
        if inner.check(key, metacard) {
            Ok(inner.entries.get(key).cloned())
        } else {
            Ok(None)
        }
    }

    fn contains_valid(&self, key: &CacheKey, metacard: &Metacard) -> DdfResult<bool> {
        let mut inner = self.lock()?;
        Ok(inner.check(key, metacard))
    }

    fn put(&self, resource: CachedResource) -> DdfResult<()> {
        let mut inner = self.lock()?;
        inner.remove_entry(&resource.key);

        while inner.entries.len() >= self.max_entries {
            let oldest = inner
                .entries
                .values()
                .min_by(|a, b| a.cached_at.cmp(&b.cached_at).then_with(|| a.key.cmp(&b.key)))
                .map(|entry| entry.key.clone());
            let Some(oldest) = oldest else { break };
            debug!(key = %oldest, "Evicting oldest cache entry");
            inner.remove_entry(&oldest);
            inner.stats.evictions += 1;
        }

        inner.stats.content_bytes += resource.content.len() as u64;
        inner.entries.insert(resource.key.clone(), resource);
        inner.stats.entry_count = inner.entries.len() as u64;
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> DdfResult<bool> {
        Ok(self.lock()?.remove_entry(key).is_some())
    }

    fn clear(&self) -> DdfResult<u64> {
        let mut inner = self.lock()?;
        let removed = inner.entries.len() as u64;
        inner.entries.clear();
        inner.stats.entry_count = 0;
        inner.stats.content_bytes = 0;
        Ok(removed)
    }

    fn stats(&self) -> DdfResult<CacheStats> {
        Ok(self.lock()?.stats.clone())
    }
}
