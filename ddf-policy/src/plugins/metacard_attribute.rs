//! Security policy taken directly from metacard attributes.

use ddf_core::ConfigCell;
use serde::{Deserialize, Serialize};

use crate::attribute_set::AttributeSetEvaluator;
use crate::event::{LifecycleEvent, PolicyContext};
use crate::map::PolicyResponse;
use crate::plugin::{PolicyPlugin, StopProcessing};

pub const PLUGIN_NAME: &str = "metacard-attributes";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetacardAttributePolicyConfig {
    /// Attribute names whose values become policy.
    pub attributes: Vec<String>,
}

/// Item policy from configured attributes on create, update and reads; on
/// delete the union across all deleted metacards becomes operation policy.
#[derive(Debug, Default)]
pub struct MetacardAttributeSecurityPolicyPlugin {
    evaluator: ConfigCell<AttributeSetEvaluator>,
}

impl MetacardAttributeSecurityPolicyPlugin {
    pub fn new(config: &MetacardAttributePolicyConfig) -> Self {
        Self {
            evaluator: ConfigCell::new(AttributeSetEvaluator::new(config.attributes.iter().cloned())),
        }
    }

    pub fn attributes(&self) -> Vec<String> {
        self.evaluator.load().attributes().to_vec()
    }

    pub fn set_attributes(&self, attributes: Vec<String>) {
        self.evaluator.store(AttributeSetEvaluator::new(attributes));
    }
}

impl PolicyPlugin for MetacardAttributeSecurityPolicyPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>) -> Result<PolicyResponse, StopProcessing> {
        let evaluator = self.evaluator.load();
        if evaluator.is_empty() {
            return Ok(PolicyResponse::empty());
        }
        let response = match ctx.event {
            LifecycleEvent::PreCreate(metacard)
            | LifecycleEvent::PreUpdate { metacard, .. }
            | LifecycleEvent::PostQuery(metacard)
            | LifecycleEvent::PostResource(metacard) => PolicyResponse::item(evaluator.evaluate(metacard)),
            LifecycleEvent::PreDelete(metacards) => {
                PolicyResponse::operation(evaluator.evaluate_all(metacards))
            }
            LifecycleEvent::PreQuery(_) | LifecycleEvent::PreResource(_) => PolicyResponse::empty(),
        };
        Ok(response)
    }
}
