//! Error types for DDF policy and cache operations

use thiserror::Error;

/// Violated preconditions on caller-supplied arguments.
///
/// These are programming errors on the caller's side and are never
/// downgraded to an empty result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("Required argument missing: {field}")]
    MissingArgument { field: String },

    #[error("Invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },
}

/// Catalog framework errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Source unavailable: {source_id}")]
    SourceUnavailable { source_id: String },

    #[error("Query timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
}

/// Resource cache store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Incompatible options: {option_a} and {option_b}")]
    IncompatibleOptions { option_a: String, option_b: String },

    #[error("Failed to read configuration from {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },
}

/// Master error type for the DDF policy and cache layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DdfError {
    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl DdfError {
    /// Shorthand for a missing required argument.
    pub fn missing(field: impl Into<String>) -> Self {
        DdfError::Precondition(PreconditionError::MissingArgument {
            field: field.into(),
        })
    }

    /// Returns true for caller-side precondition violations.
    pub fn is_precondition(&self) -> bool {
        matches!(self, DdfError::Precondition(_))
    }
}

/// Result type alias for DDF operations.
pub type DdfResult<T> = Result<T, DdfError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_error_display() {
        let err = PreconditionError::MissingArgument {
            field: "metacard.id".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Required argument missing"));
        assert!(msg.contains("metacard.id"));
    }

    #[test]
    fn test_catalog_error_display_query_failed() {
        let err = CatalogError::QueryFailed {
            reason: "solr down".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Query failed"));
        assert!(msg.contains("solr down"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "registry.bypass_access".to_string(),
            value: "role".to_string(),
            reason: "expected key=value".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("registry.bypass_access"));
        assert!(msg.contains("role"));
        assert!(msg.contains("expected key=value"));
    }

    #[test]
    fn test_ddf_error_from_variants() {
        let precondition = DdfError::from(PreconditionError::MissingArgument {
            field: "id".to_string(),
        });
        assert!(precondition.is_precondition());

        let catalog = DdfError::from(CatalogError::Timeout { elapsed_ms: 10 });
        assert!(matches!(catalog, DdfError::Catalog(_)));
        assert!(!catalog.is_precondition());

        let cache = DdfError::from(CacheError::LockPoisoned);
        assert!(matches!(cache, DdfError::Cache(_)));

        let config = DdfError::from(ConfigError::Parse {
            reason: "eof".to_string(),
        });
        assert!(matches!(config, DdfError::Config(_)));
    }

    #[test]
    fn test_missing_shorthand() {
        let err = DdfError::missing("metacard");
        assert_eq!(
            err,
            DdfError::Precondition(PreconditionError::MissingArgument {
                field: "metacard".to_string()
            })
        );
    }
}
