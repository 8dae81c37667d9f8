//! Aggregation properties across plugin orderings and lifecycle events.

use std::sync::Arc;

use ddf_core::{core_attributes, Metacard, Query, ResourceRequest};
use ddf_policy::{
    AttributeSetEvaluator, LifecycleEvent, MetacardAttributePolicyConfig,
    MetacardAttributeSecurityPolicyPlugin, PolicyConfig, PolicyContext, PolicyDecisionAggregator,
    PolicyPlugin, PolicyResponse, StopProcessing,
};
use ddf_test_utils::{assertions, fixtures, generators, StaticPlugin, StoppingPlugin};
use proptest::prelude::*;

fn evaluate_with(plugins: Vec<Arc<dyn PolicyPlugin>>, metacard: &Metacard) -> Result<PolicyResponse, StopProcessing> {
    PolicyDecisionAggregator::with_plugins(plugins).evaluate(&PolicyContext::new(LifecycleEvent::PostQuery(metacard)))
}

#[test]
fn two_role_plugins_union() {
    let aggregator = PolicyDecisionAggregator::new();
    aggregator.add_plugin(Arc::new(StaticPlugin::item("users", "role", &["user"])));
    aggregator.add_plugin(Arc::new(StaticPlugin::item("admins", "role", &["admin"])));

    let metacard = fixtures::resource_metacard("a");
    let response = aggregator
        .evaluate(&PolicyContext::new(LifecycleEvent::PreCreate(&metacard)))
        .unwrap();
    assertions::assert_policy_values(&response.item_policy, "role", &["user", "admin"]);
}

#[test]
fn parsed_security_scenario_through_plugin() {
    let plugin = MetacardAttributeSecurityPolicyPlugin::new(&MetacardAttributePolicyConfig {
        attributes: vec!["parsed.security".to_string(), "parsed.other".to_string()],
    });
    let metacard = Metacard::new("a").with_attribute("parsed.security", ["A", "B", "C"]);
    let response = plugin
        .evaluate(&PolicyContext::new(LifecycleEvent::PostQuery(&metacard)))
        .unwrap();
    assertions::assert_policy_values(&response.item_policy, "parsed.security", &["A", "B", "C"]);
    assert!(!response.item_policy.contains_key("parsed.other"));
}

#[test]
fn stop_wins_regardless_of_position() {
    let metacard = fixtures::resource_metacard("a");
    for position in 0..3 {
        let stopping = Arc::new(StoppingPlugin::new("deny", "locked"));
        let mut plugins: Vec<Arc<dyn PolicyPlugin>> = vec![
            Arc::new(StaticPlugin::item("a", "role", &["user"])),
            Arc::new(StaticPlugin::operation("b", "op", &["x"])),
        ];
        plugins.insert(position, stopping.clone());

        let err = evaluate_with(plugins, &metacard).unwrap_err();
        assert_eq!(err.plugin, "deny");
        assert_eq!(stopping.calls(), 1);
    }
}

#[test]
fn plugins_after_stop_are_not_run() {
    let after = Arc::new(StaticPlugin::item("after", "role", &["user"]));
    let plugins: Vec<Arc<dyn PolicyPlugin>> = vec![Arc::new(StoppingPlugin::new("deny", "locked")), after.clone()];
    assert!(evaluate_with(plugins, &fixtures::resource_metacard("a")).is_err());
    assert_eq!(after.calls(), 0);
}

#[test]
fn query_and_resource_requests_produce_no_policy_from_builtins() {
    let config = PolicyConfig::from_toml(
        r#"
[metacard_attributes]
attributes = ["security.access-groups"]

[registry]
read_access = ["role=guest"]
"#,
    )
    .unwrap();
    let aggregator = config.build_aggregator();
    let query = Query::by_id("a");
    let request = ResourceRequest::by_id("a");
    for event in [LifecycleEvent::PreQuery(&query), LifecycleEvent::PreResource(&request)] {
        assert!(aggregator.evaluate(&PolicyContext::new(event)).unwrap().is_empty());
    }
}

#[test]
fn full_pipeline_delete_batch() {
    let config = PolicyConfig::from_toml(
        r#"
[registry]
delete_access = ["role=registry-admin"]

[metacard_attributes]
attributes = ["security.access-groups"]
"#,
    )
    .unwrap();
    let aggregator = config.build_aggregator();
    let batch = vec![
        fixtures::secured_metacard("a", &["ops"]),
        fixtures::registry_metacard("b", "urn:node:1"),
        fixtures::revision_metacard("c"),
    ];
    let response = aggregator
        .evaluate(&PolicyContext::new(LifecycleEvent::PreDelete(&batch)))
        .unwrap();

    assert!(response.item_policy.is_empty());
    assertions::assert_policy_values(&response.operation_policy, core_attributes::SECURITY_ACCESS_GROUPS, &["ops"]);
    assertions::assert_policy_values(&response.operation_policy, "role", &["registry-admin"]);
    assertions::assert_policy_values(&response.operation_policy, "system-history", &["true"]);
}

#[test]
fn plugin_hot_swap_does_not_disturb_snapshot() {
    let aggregator = PolicyDecisionAggregator::new();
    aggregator.add_plugin(Arc::new(StaticPlugin::item("users", "role", &["user"])));
    let snapshot = aggregator.plugins();
    aggregator.add_plugin(Arc::new(StaticPlugin::item("admins", "role", &["admin"])));
    assert!(aggregator.remove_plugin("users"));

    assert_eq!(snapshot.len(), 1);
    assert_eq!(aggregator.plugin_names(), vec!["admins".to_string()]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_merge_is_order_independent(
        responses in prop::collection::vec(generators::arb_policy_response(), 0..5),
        metacard in generators::arb_metacard(),
    ) {
        let build = |order: &[usize]| -> Vec<Arc<dyn PolicyPlugin>> {
            order
                .iter()
                .map(|&i| Arc::new(StaticPlugin::new(format!("p{}", i), responses[i].clone())) as Arc<dyn PolicyPlugin>)
                .collect()
        };
        let forward: Vec<usize> = (0..responses.len()).collect();
        let reverse: Vec<usize> = forward.iter().rev().copied().collect();

        let a = evaluate_with(build(&forward), &metacard).unwrap();
        let b = evaluate_with(build(&reverse), &metacard).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_evaluator_values_match_metacard(metacard in generators::arb_metacard()) {
        let names: Vec<String> = metacard.attributes.keys().cloned().collect();
        let policy = AttributeSetEvaluator::new(names).evaluate(&metacard);
        for (name, values) in &metacard.attributes {
            let expected: std::collections::BTreeSet<String> = values
                .iter()
                .map(|v| v.to_string())
                .filter(|v| !v.is_empty())
                .collect();
            match policy.get(name) {
                Some(set) => prop_assert_eq!(set, &expected),
                None => prop_assert!(expected.is_empty()),
            }
        }
    }
}
