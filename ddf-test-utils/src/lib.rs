//! DDF Test Utilities
//!
//! Shared test infrastructure for the DDF workspace:
//! - Proptest generators for metacards, request options and policy maps
//! - Mock catalog, cache store and policy plugins
//! - Fixtures for common records
//! - Assertions for DDF error kinds

// Re-export core types for convenience
pub use ddf_core::{
    core_attributes, tags, AttributeValue, CacheError, CatalogError, CatalogFramework, DdfError,
    DdfResult, Metacard, Query, QueryResponse, ResourceRequest,
};
pub use ddf_cache::{CacheKey, CacheStats, CachedResource, ResourceCacheStore};
pub use ddf_policy::{PolicyContext, PolicyMap, PolicyPlugin, PolicyResponse, StopProcessing};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// MOCK CATALOG
// ============================================================================

/// Catalog that answers every query with a fixed result list, or fails.
#[derive(Debug, Default)]
pub struct MockCatalog {
    results: Mutex<Vec<Metacard>>,
    failure: Mutex<Option<CatalogError>>,
    queries: Mutex<Vec<Query>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: Vec<Metacard>) -> Self {
        let catalog = Self::new();
        catalog.set_results(results);
        catalog
    }

    pub fn failing(error: CatalogError) -> Self {
        let catalog = Self::new();
        catalog.set_failure(Some(error));
        catalog
    }

    pub fn set_results(&self, results: Vec<Metacard>) {
        *self.results.lock().unwrap_or_else(|e| e.into_inner()) = results;
    }

    pub fn set_failure(&self, error: Option<CatalogError>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = error;
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl CatalogFramework for MockCatalog {
    fn query(&self, query: &Query) -> DdfResult<QueryResponse> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.clone());
        if let Some(error) = self.failure.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            return Err(error.into());
        }
        let results = self.results.lock().unwrap_or_else(|e| e.into_inner()).clone();
        Ok(QueryResponse::new(results))
    }
}

// ============================================================================
// FAILING STORE
// ============================================================================

/// Cache store whose every operation fails.
#[derive(Debug, Clone)]
pub struct FailingStore {
    reason: String,
}

impl FailingStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    fn error(&self) -> DdfError {
        CacheError::Unavailable {
            reason: self.reason.clone(),
        }
        .into()
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new("store offline")
    }
}

impl ResourceCacheStore for FailingStore {
    fn get_valid(&self, _key: &CacheKey, _metacard: &Metacard) -> DdfResult<Option<CachedResource>> {
        Err(self.error())
    }

    fn contains_valid(&self, _key: &CacheKey, _metacard: &Metacard) -> DdfResult<bool> {
        Err(self.error())
    }

    fn put(&self, _resource: CachedResource) -> DdfResult<()> {
        Err(self.error())
    }

    fn remove(&self, _key: &CacheKey) -> DdfResult<bool> {
        Err(self.error())
    }

    fn clear(&self) -> DdfResult<u64> {
        Err(self.error())
    }

    fn stats(&self) -> DdfResult<CacheStats> {
        Err(self.error())
    }
}

// ============================================================================
// MOCK POLICY PLUGINS
// ============================================================================

/// Plugin returning the same response for every event.
#[derive(Debug)]
pub struct StaticPlugin {
    name: String,
    response: PolicyResponse,
    calls: AtomicUsize,
}

impl StaticPlugin {
    pub fn new(name: impl Into<String>, response: PolicyResponse) -> Self {
        Self {
            name: name.into(),
            response,
            calls: AtomicUsize::new(0),
        }
    }

    /// Plugin contributing `{key: values}` as item policy.
    pub fn item(name: impl Into<String>, key: &str, values: &[&str]) -> Self {
        Self::new(
            name,
            PolicyResponse::item(PolicyMap::single(key, values.iter().copied())),
        )
    }

    /// Plugin contributing `{key: values}` as operation policy.
    pub fn operation(name: impl Into<String>, key: &str, values: &[&str]) -> Self {
        Self::new(
            name,
            PolicyResponse::operation(PolicyMap::single(key, values.iter().copied())),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PolicyPlugin for StaticPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, _ctx: &PolicyContext<'_>) -> Result<PolicyResponse, StopProcessing> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Plugin that denies every event.
#[derive(Debug)]
pub struct StoppingPlugin {
    name: String,
    reason: String,
    calls: AtomicUsize,
}

impl StoppingPlugin {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PolicyPlugin for StoppingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, _ctx: &PolicyContext<'_>) -> Result<PolicyResponse, StopProcessing> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StopProcessing::new(self.name.clone(), self.reason.clone()))
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for DDF types.

    use super::*;
    use proptest::prelude::*;
    use std::collections::{BTreeMap, BTreeSet};

    /// Non-blank metacard id.
    pub fn arb_metacard_id() -> impl Strategy<Value = String> {
        "[a-z0-9]{1,12}"
    }

    pub fn arb_source_id() -> impl Strategy<Value = Option<String>> {
        prop::option::of("[a-z]{3,8}")
    }

    pub fn arb_attribute_value() -> impl Strategy<Value = AttributeValue> {
        prop_oneof![
            "[A-Za-z0-9 ]{0,12}".prop_map(AttributeValue::String),
            (1577836800i64..1893456000i64).prop_map(|secs| {
                AttributeValue::Date(
                    chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(chrono::Utc::now),
                )
            }),
            prop::collection::vec(any::<u8>(), 0..16).prop_map(AttributeValue::Binary),
            any::<i64>().prop_map(AttributeValue::Long),
            any::<bool>().prop_map(AttributeValue::Boolean),
        ]
    }

    pub fn arb_attributes() -> impl Strategy<Value = BTreeMap<String, Vec<AttributeValue>>> {
        prop::collection::btree_map("[a-z]{1,6}(\\.[a-z]{1,6})?", prop::collection::vec(arb_attribute_value(), 0..4), 0..6)
    }

    pub fn arb_tags() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set(
            prop_oneof![
                Just(tags::RESOURCE.to_string()),
                Just(tags::REVISION.to_string()),
                Just(tags::DELETED.to_string()),
                Just(tags::REGISTRY.to_string()),
                Just(tags::REGISTRY_REMOTE.to_string()),
            ],
            0..3,
        )
    }

    pub fn arb_metacard() -> impl Strategy<Value = Metacard> {
        (arb_metacard_id(), arb_source_id(), arb_tags(), arb_attributes()).prop_map(
            |(id, source_id, tags, attributes)| {
                let mut metacard = Metacard::new(id);
                metacard.source_id = source_id;
                metacard.tags = tags;
                metacard.attributes = attributes;
                metacard
            },
        )
    }

    /// Resource request options.
    pub fn arb_options() -> impl Strategy<Value = BTreeMap<String, String>> {
        prop::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{0,8}", 0..5)
    }

    /// By-id request for `id` carrying arbitrary options.
    pub fn arb_resource_request(id: String) -> impl Strategy<Value = ResourceRequest> {
        arb_options().prop_map(move |options| {
            options
                .into_iter()
                .fold(ResourceRequest::by_id(id.clone()), |request, (k, v)| request.with_option(k, v))
        })
    }

    pub fn arb_policy_map() -> impl Strategy<Value = PolicyMap> {
        prop::collection::btree_map("[a-d]", prop::collection::btree_set("[a-f]", 0..4), 0..4)
            .prop_map(PolicyMap::from)
    }

    pub fn arb_policy_response() -> impl Strategy<Value = PolicyResponse> {
        (arb_policy_map(), arb_policy_map()).prop_map(|(item, operation)| PolicyResponse::new(item, operation))
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records for common scenarios.

    use super::*;

    /// Plain resource metacard with a title and checksum.
    pub fn resource_metacard(id: &str) -> Metacard {
        Metacard::new(id)
            .with_tag(tags::RESOURCE)
            .with_resource_uri(format!("content:{}", id))
            .with_attribute(core_attributes::TITLE, ["Test Product"])
            .with_attribute(core_attributes::CHECKSUM, ["c0ffee"])
    }

    /// Local registry entry.
    pub fn registry_metacard(id: &str, registry_id: &str) -> Metacard {
        Metacard::new(id)
            .with_tag(tags::REGISTRY)
            .with_attribute(core_attributes::REGISTRY_ID, [registry_id])
    }

    /// History record of `id`.
    pub fn revision_metacard(id: &str) -> Metacard {
        Metacard::new(format!("{}-rev", id)).with_tag(tags::REVISION)
    }

    /// Metacard restricted to `groups`.
    pub fn secured_metacard(id: &str, groups: &[&str]) -> Metacard {
        resource_metacard(id).with_attribute(core_attributes::SECURITY_ACCESS_GROUPS, groups.iter().copied())
    }

    /// Metacard carrying inline XML metadata.
    pub fn xml_metacard(id: &str, xml: &str) -> Metacard {
        resource_metacard(id).with_attribute(core_attributes::METADATA, [xml])
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for DDF results.

    use super::*;

    /// Assert that a DdfResult is a precondition failure.
    #[track_caller]
    pub fn assert_precondition<T: std::fmt::Debug>(result: &DdfResult<T>) {
        match result {
            Err(DdfError::Precondition(_)) => {}
            other => panic!("Expected Precondition error, got: {:?}", other),
        }
    }

    /// Assert that a DdfResult is a Config error.
    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &DdfResult<T>) {
        match result {
            Err(DdfError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    /// Assert that `policy` holds exactly `values` under `key`.
    #[track_caller]
    pub fn assert_policy_values(policy: &PolicyMap, key: &str, values: &[&str]) {
        let actual: Vec<&str> = policy
            .get(key)
            .unwrap_or_else(|| panic!("Expected key {} in policy {}", key, policy))
            .iter()
            .map(String::as_str)
            .collect();
        let mut expected = values.to_vec();
        expected.sort_unstable();
        expected.dedup();
        assert_eq!(actual, expected, "Wrong values for {}", key);
    }
}

// ============================================================================
// TESTS
// ============================================================================
