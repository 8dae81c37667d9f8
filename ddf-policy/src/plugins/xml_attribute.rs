//! Security policy harvested from the XML metadata of a metacard.

use ddf_core::ConfigCell;

use crate::event::{LifecycleEvent, PolicyContext};
use crate::map::PolicyResponse;
use crate::plugin::{PolicyPlugin, StopProcessing};
use crate::xml_harvest::{XmlAttributeHarvester, XmlAttributeHarvesterConfig};

pub const PLUGIN_NAME: &str = "xml-attributes";

#[derive(Debug, Default)]
pub struct XmlAttributeSecurityPolicyPlugin {
    harvester: ConfigCell<XmlAttributeHarvester>,
}

impl XmlAttributeSecurityPolicyPlugin {
    pub fn new(config: &XmlAttributeHarvesterConfig) -> Self {
        Self {
            harvester: ConfigCell::new(XmlAttributeHarvester::new(config)),
        }
    }

    pub fn set_config(&self, config: &XmlAttributeHarvesterConfig) {
        self.harvester.store(XmlAttributeHarvester::new(config));
    }
}

impl PolicyPlugin for XmlAttributeSecurityPolicyPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>) -> Result<PolicyResponse, StopProcessing> {
        let harvester = self.harvester.load();
        if harvester.is_empty() {
            return Ok(PolicyResponse::empty());
        }
        let response = match ctx.event {
            LifecycleEvent::PreCreate(metacard)
            | LifecycleEvent::PreUpdate { metacard, .. }
            | LifecycleEvent::PostQuery(metacard)
            | LifecycleEvent::PostResource(metacard) => PolicyResponse::item(harvester.evaluate(metacard)),
            LifecycleEvent::PreDelete(metacards) => {
                PolicyResponse::operation(harvester.evaluate_all(metacards))
            }
            LifecycleEvent::PreQuery(_) | LifecycleEvent::PreResource(_) => PolicyResponse::empty(),
        };
        Ok(response)
    }
}
