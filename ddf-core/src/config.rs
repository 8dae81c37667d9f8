//! Configuration loading and hot-swappable configuration cells

use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, DdfResult};

/// Load and deserialize a TOML configuration file.
pub fn load_toml<T: DeserializeOwned>(path: impl AsRef<Path>) -> DdfResult<T> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_toml(&raw)
}

/// Deserialize TOML configuration text.
pub fn parse_toml<T: DeserializeOwned>(raw: &str) -> DdfResult<T> {
    toml::from_str(raw).map_err(|e| {
        ConfigError::Parse {
            reason: e.to_string(),
        }
        .into()
    })
}

/// Configuration slot that readers snapshot and writers replace wholesale.
///
/// Readers clone the inner `Arc` under a short read lock and then work on an
/// immutable snapshot, so a concurrent `store` never changes a configuration
/// mid-evaluation.
#[derive(Debug, Default)]
pub struct ConfigCell<T> {
    inner: RwLock<Arc<T>>,
}

impl<T> ConfigCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(Arc::new(value)),
        }
    }

    /// Snapshot the current configuration.
    pub fn load(&self) -> Arc<T> {
        // A poisoned lock still holds a fully written Arc.
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the configuration.
    pub fn store(&self, value: T) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(value);
    }

    /// Replace the configuration with a modified copy of the current one.
    pub fn update<F>(&self, f: F)
    where
        T: Clone,
        F: FnOnce(&mut T),
    {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let mut next = T::clone(&guard);
        f(&mut next);
        *guard = Arc::new(next);
    }
}

/// Resource cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    /// Whether downloaded products are cached at all.
    pub enabled: bool,
    /// Maximum number of cached products before the oldest are evicted.
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
        }
    }
}

impl CacheSettings {
    /// Apply `DDF_CACHE_ENABLED` / `DDF_CACHE_MAX_ENTRIES` overrides.
    pub fn with_env_overrides(self) -> DdfResult<Self> {
        self.with_overrides(
            std::env::var("DDF_CACHE_ENABLED").ok().as_deref(),
            std::env::var("DDF_CACHE_MAX_ENTRIES").ok().as_deref(),
        )
    }

    fn with_overrides(mut self, enabled: Option<&str>, max_entries: Option<&str>) -> DdfResult<Self> {
        if let Some(raw) = enabled {
            self.enabled = match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                other => {
                    return Err(ConfigError::InvalidValue {
                        field: "DDF_CACHE_ENABLED".to_string(),
                        value: other.to_string(),
                        reason: "expected a boolean".to_string(),
                    }
                    .into())
                }
            };
        }
        if let Some(raw) = max_entries {
            self.max_entries = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "DDF_CACHE_MAX_ENTRIES".to_string(),
                value: raw.to_string(),
                reason: "expected a non-negative integer".to_string(),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the settings.
    pub fn validate(&self) -> DdfResult<()> {
        if self.max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_entries".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
