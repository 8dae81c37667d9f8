//! DDF Cache - Resource Cache Keys, Gate and Management
//!
//! Derives deterministic cache keys for downloaded products, checks cached
//! entries against the current metacard before handing them out, and exposes
//! the management view of the cache. The physical store sits behind
//! [`ResourceCacheStore`]; [`InMemoryResourceCache`] is the in-process one.

pub mod admin;
pub mod entry;
pub mod gate;
pub mod key;
pub mod memory;
pub mod traits;

pub use admin::{CacheAdmin, CacheAdminService, DownloadSettings};
pub use entry::{CachedResource, MetacardFingerprint, Validity};
pub use gate::ResourceCacheGate;
pub use key::{CacheKey, KEY_LENGTH};
pub use memory::InMemoryResourceCache;
pub use traits::{CacheStats, DownloadManager, ResourceCacheStore};
