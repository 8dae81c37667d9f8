//! Resource (product) retrieval requests

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known resource request option names.
pub mod options {
    /// Selects an alternate rendition of the product, e.g. `preview`.
    pub const QUALIFIER: &str = "qualifier";
    /// Requested content disposition (`inline` / `attachment`).
    pub const CONTENT_DISPOSITION: &str = "content-disposition";
}

/// How the product is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "target", rename_all = "snake_case")]
pub enum ResourceTarget {
    /// By the owning metacard's id.
    Id(String),
    /// By the product URI.
    Uri(String),
}

/// Request to retrieve the product behind a metacard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub target: ResourceTarget,
    /// Options that select a variant of the product. Sorted by key.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl ResourceRequest {
    /// The default request for a metacard: by id, no options.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            target: ResourceTarget::Id(id.into()),
            options: BTreeMap::new(),
        }
    }

    pub fn by_uri(uri: impl Into<String>) -> Self {
        Self {
            target: ResourceTarget::Uri(uri.into()),
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_qualifier(self, qualifier: impl Into<String>) -> Self {
        self.with_option(options::QUALIFIER, qualifier)
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.options.get(options::QUALIFIER).map(String::as_str)
    }
}
