//! Cache management service.
//!
//! Exposes the cache switch and per-metacard presence checks to management
//! tooling. Every answer is side-effect free and safe to poll. A disabled
//! cache reports nothing as present; ambiguous or failed id lookups report
//! `false` rather than an error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ddf_core::{CacheSettings, CatalogFramework, Metacard, Query};
use tracing::{debug, warn};

use crate::gate::ResourceCacheGate;
use crate::traits::{CacheStats, DownloadManager, ResourceCacheStore};

/// Management interface of the resource cache.
pub trait CacheAdmin: Send + Sync {
    fn is_cache_enabled(&self) -> bool;

    fn contains(&self, metacard: &Metacard) -> bool;

    fn contains_by_id(&self, id: &str) -> bool;

    fn stats(&self) -> Option<CacheStats>;
}

/// Caching switch backed by an atomic flag.
#[derive(Debug)]
pub struct DownloadSettings {
    cache_enabled: AtomicBool,
}

impl DownloadSettings {
    pub fn new(cache_enabled: bool) -> Self {
        Self {
            cache_enabled: AtomicBool::new(cache_enabled),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.enabled)
    }

    pub fn set_cache_enabled(&self, enabled: bool) {
        self.cache_enabled.store(enabled, Ordering::Release);
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::default())
    }
}

impl DownloadManager for DownloadSettings {
    fn is_cache_enabled(&self) -> bool {
        self.cache_enabled.load(Ordering::Acquire)
    }
}

/// Default [`CacheAdmin`] implementation.
pub struct CacheAdminService<S, C, D>
where
    S: ResourceCacheStore + ?Sized,
    C: CatalogFramework + ?Sized,
    D: DownloadManager + ?Sized,
{
    gate: ResourceCacheGate<S>,
    catalog: Arc<C>,
    downloads: Arc<D>,
}

impl<S, C, D> CacheAdminService<S, C, D>
where
    S: ResourceCacheStore + ?Sized,
    C: CatalogFramework + ?Sized,
    D: DownloadManager + ?Sized,
{
    pub fn new(gate: ResourceCacheGate<S>, catalog: Arc<C>, downloads: Arc<D>) -> Self {
        Self {
            gate,
            catalog,
            downloads,
        }
    }

    /// Resolve `id` to exactly one metacard.
    fn resolve(&self, id: &str) -> Option<Metacard> {
        if id.trim().is_empty() {
            debug!("Blank id, reporting not cached");
            return None;
        }
        match self.catalog.query(&Query::by_id(id)) {
            Ok(response) => match response.single() {
                Some(metacard) => Some(metacard.clone()),
                None => {
                    debug!(id, results = response.results.len(), hits = response.hits, "Id did not resolve to a single metacard");
                    None
                }
            },
            Err(e) => {
                warn!(id, error = %e, "Catalog query failed while checking cache");
                None
            }
        }
    }
}

impl<S, C, D> CacheAdmin for CacheAdminService<S, C, D>
where
    S: ResourceCacheStore + ?Sized,
    C: CatalogFramework + ?Sized,
    D: DownloadManager + ?Sized,
{
    fn is_cache_enabled(&self) -> bool {
        self.downloads.is_cache_enabled()
    }

    fn contains(&self, metacard: &Metacard) -> bool {
        if !self.is_cache_enabled() {
            return false;
        }
        match self.gate.contains(metacard) {
            Ok(present) => present,
            Err(e) => {
                warn!(metacard_id = %metacard.id, error = %e, "Rejected cache presence check");
                false
            }
        }
    }

    fn contains_by_id(&self, id: &str) -> bool {
        if !self.is_cache_enabled() {
            return false;
        }
        self.resolve(id)
            .map(|metacard| self.contains(&metacard))
            .unwrap_or(false)
    }

    fn stats(&self) -> Option<CacheStats> {
        self.gate.stats()
    }
}
