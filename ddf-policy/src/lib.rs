//! DDF Policy - Policy Plugin Evaluation Pipeline
//!
//! Computes access-control policy for catalog operations. Each plugin looks
//! at a lifecycle event and returns an item policy and an operation policy;
//! the [`PolicyDecisionAggregator`] unions them, or stops early when a plugin
//! denies the operation.

pub mod aggregator;
pub mod attribute_set;
pub mod config;
pub mod event;
pub mod map;
pub mod permission;
pub mod plugin;
pub mod plugins;
pub mod xml_harvest;

pub use aggregator::PolicyDecisionAggregator;
pub use attribute_set::AttributeSetEvaluator;
pub use config::PolicyConfig;
pub use event::{EventProperties, LifecycleEvent, LifecycleEventKind, PolicyContext};
pub use map::{PolicyMap, PolicyResponse};
pub use permission::{parse_permission, parse_permissions, parse_permissions_strict, PermissionParseError};
pub use plugin::{PolicyPlugin, StopProcessing};
pub use plugins::{
    HistorianPolicyConfig, HistorianPolicyPlugin, MetacardAttributePolicyConfig,
    MetacardAttributeSecurityPolicyPlugin, RegistryPolicyConfig, RegistryPolicyPlugin,
    XmlAttributeSecurityPolicyPlugin,
};
pub use xml_harvest::{XmlAttributeHarvester, XmlAttributeHarvesterConfig};
