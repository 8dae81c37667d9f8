//! Filter expressions for catalog queries
//!
//! The catalog framework owns query evaluation; this layer only needs to
//! express "the metacard with this id".

use serde::{Deserialize, Serialize};

/// Attribute equality comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FilterExpr {
    /// Attribute to filter on
    pub attribute: String,
    /// Value the attribute must equal (JSON value for flexibility)
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub value: serde_json::Value,
}

impl FilterExpr {
    /// Create an equality filter.
    pub fn eq(attribute: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            attribute: attribute.into(),
            value,
        }
    }

    /// The compared value when it is a plain string.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}
