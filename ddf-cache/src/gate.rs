//! Validity-checked access to the product cache.
//!
//! The gate turns a metacard (and optionally a request) into a [`CacheKey`]
//! and asks the store for an entry that is still valid for that metacard.
//! Store failures are logged and reported as a miss; only a blank metacard
//! id is an error.

use std::sync::Arc;

use ddf_core::{DdfResult, Metacard, ResourceRequest};
use tracing::{debug, warn};

use crate::entry::CachedResource;
use crate::key::CacheKey;
use crate::traits::{CacheStats, ResourceCacheStore};

/// Validity-checked front of a [`ResourceCacheStore`].
pub struct ResourceCacheGate<S>
where
    S: ResourceCacheStore + ?Sized,
{
    store: Arc<S>,
}

impl<S> ResourceCacheGate<S>
where
    S: ResourceCacheStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Cached product for the default request of `metacard`.
    pub fn get(&self, metacard: &Metacard) -> DdfResult<Option<CachedResource>> {
        self.get_with(metacard, &default_request(metacard))
    }

    /// Cached product for `request` if still valid for `metacard`.
    pub fn get_with(
        &self,
        metacard: &Metacard,
        request: &ResourceRequest,
    ) -> DdfResult<Option<CachedResource>> {
        let key = CacheKey::build(metacard, request)?;
        match self.store.get_valid(&key, metacard) {
            Ok(found) => {
                debug!(key = %key, metacard_id = %metacard.id, hit = found.is_some(), "Resource cache lookup");
                Ok(found)
            }
            Err(e) => {
                warn!(key = %key, metacard_id = %metacard.id, error = %e, "Resource cache lookup failed, treating as miss");
                Ok(None)
            }
        }
    }

    /// Whether the default request of `metacard` has a valid cached product.
    pub fn contains(&self, metacard: &Metacard) -> DdfResult<bool> {
        self.contains_with(metacard, &default_request(metacard))
    }

    /// Whether `request` has a valid cached product for `metacard`.
    pub fn contains_with(&self, metacard: &Metacard, request: &ResourceRequest) -> DdfResult<bool> {
        let key = CacheKey::build(metacard, request)?;
        match self.store.contains_valid(&key, metacard) {
            Ok(present) => Ok(present),
            Err(e) => {
                warn!(key = %key, metacard_id = %metacard.id, error = %e, "Resource cache check failed, treating as absent");
                Ok(false)
            }
        }
    }

    /// Cache a downloaded product for `request`, pinned to the current `metacard`.
    ///
    /// Returns whether the product was stored. A failing store is logged and
    /// reported as `false`.
    pub fn admit(
        &self,
        metacard: &Metacard,
        request: &ResourceRequest,
        mime_type: &str,
        content: Vec<u8>,
    ) -> DdfResult<bool> {
        let key = CacheKey::build(metacard, request)?;
        let resource = CachedResource::new(key.clone(), metacard, mime_type, content);
        match self.store.put(resource) {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(key = %key, metacard_id = %metacard.id, error = %e, "Failed to cache resource");
                Ok(false)
            }
        }
    }

    /// Drop the cached product for `request`.
    pub fn invalidate(&self, metacard: &Metacard, request: &ResourceRequest) -> DdfResult<bool> {
        let key = CacheKey::build(metacard, request)?;
        match self.store.remove(&key) {
            Ok(removed) => Ok(removed),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to invalidate cached resource");
                Ok(false)
            }
        }
    }

    /// Store statistics, or `None` if the store cannot report them.
    pub fn stats(&self) -> Option<CacheStats> {
        match self.store.stats() {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "Failed to read resource cache statistics");
                None
            }
        }
    }
}

impl<S> Clone for ResourceCacheGate<S>
where
    S: ResourceCacheStore + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

fn default_request(metacard: &Metacard) -> ResourceRequest {
    ResourceRequest::by_id(metacard.id.clone())
}
