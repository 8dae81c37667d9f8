//! DDF Core - Metacard and Boundary Types
//!
//! Data types shared by the policy pipeline and the resource cache: the
//! metacard model, catalog and resource-request boundaries, errors and
//! configuration plumbing. No policy or caching decisions live here.

pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod identity;
pub mod metacard;
pub mod request;
pub mod telemetry;

pub use catalog::{CatalogFramework, Query, QueryResponse};
pub use config::{load_toml, parse_toml, CacheSettings, ConfigCell};
pub use error::{CacheError, CatalogError, ConfigError, DdfError, DdfResult, PreconditionError};
pub use filter::FilterExpr;
pub use identity::{ContentHash, MetacardId};
pub use metacard::{core_attributes, tags, AttributeValue, Metacard};
pub use request::{options as request_options, ResourceRequest, ResourceTarget};
pub use telemetry::{init_tracing, LogFormat};
