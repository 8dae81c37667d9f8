//! Catalog framework boundary
//!
//! The catalog framework (query federation, Solr, source adapters) lives
//! outside this layer. Cache management only needs single-result lookups.

use serde::{Deserialize, Serialize};

use crate::core_attributes;
use crate::error::DdfResult;
use crate::filter::FilterExpr;
use crate::metacard::Metacard;

/// Catalog query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub filter: FilterExpr,
    /// 1-based start index, as the catalog framework expects.
    pub start_index: u32,
    pub page_size: u32,
    /// Restrict the query to the local catalog instead of federating.
    pub local_only: bool,
}

impl Query {
    /// Query for the metacard with the given id.
    ///
    /// Requests two results so callers can detect ambiguous ids.
    pub fn by_id(id: &str) -> Self {
        Self {
            filter: FilterExpr::eq(core_attributes::ID, serde_json::Value::String(id.to_string())),
            start_index: 1,
            page_size: 2,
            local_only: true,
        }
    }
}

/// Catalog query results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<Metacard>,
    /// Total hits reported by the source, which may exceed `results.len()`.
    pub hits: u64,
}

impl QueryResponse {
    pub fn new(results: Vec<Metacard>) -> Self {
        let hits = results.len() as u64;
        Self { results, hits }
    }

    /// The single result, or `None` when zero or several matched.
    pub fn single(&self) -> Option<&Metacard> {
        match self.results.as_slice() {
            [only] if self.hits <= 1 => Some(only),
            _ => None,
        }
    }
}

/// Query capability of the catalog framework.
///
/// Implementations may block on network or storage I/O. Timeouts and
/// cancellation are the implementation's responsibility.
pub trait CatalogFramework: Send + Sync {
    fn query(&self, query: &Query) -> DdfResult<QueryResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_id_query_detects_ambiguity() {
        let query = Query::by_id("abc");
        assert_eq!(query.filter.attribute, core_attributes::ID);
        assert_eq!(query.filter.value_str(), Some("abc"));
        assert_eq!(query.page_size, 2);
        assert!(query.local_only);
    }

    #[test]
    fn test_single_result() {
        let empty = QueryResponse::default();
        assert!(empty.single().is_none());

        let one = QueryResponse::new(vec![Metacard::new("a")]);
        assert_eq!(one.single().map(|m| m.id.as_str()), Some("a"));

        let two = QueryResponse::new(vec![Metacard::new("a"), Metacard::new("b")]);
        assert!(two.single().is_none());

        let truncated = QueryResponse {
            results: vec![Metacard::new("a")],
            hits: 3,
        };
        assert!(truncated.single().is_none());
    }
}
