//! Policy pipeline configuration.

use std::path::Path;
use std::sync::Arc;

use ddf_core::{load_toml, parse_toml, ConfigError, DdfResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregator::PolicyDecisionAggregator;
use crate::plugins::{
    HistorianPolicyConfig, HistorianPolicyPlugin, MetacardAttributePolicyConfig,
    MetacardAttributeSecurityPolicyPlugin, RegistryPolicyConfig, RegistryPolicyPlugin,
    XmlAttributeSecurityPolicyPlugin,
};
use crate::xml_harvest::XmlAttributeHarvesterConfig;

/// Configuration of all built-in plugins.
///
/// ```toml
/// [historian]
/// enabled = true
///
/// [registry]
/// white_list = false
/// registry_entry_ids = ["urn:node:1"]
/// create_access = ["role=registry-writer"]
///
/// [metacard_attributes]
/// attributes = ["security.access-groups"]
///
/// [xml_attributes]
/// elements = ["Security"]
/// intersections = ["releasableTo"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    pub historian: HistorianPolicyConfig,
    pub registry: RegistryPolicyConfig,
    pub metacard_attributes: MetacardAttributePolicyConfig,
    pub xml_attributes: XmlAttributeHarvesterConfig,
}

impl PolicyConfig {
    /// Load and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> DdfResult<Self> {
        let config: Self = load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(raw: &str) -> DdfResult<Self> {
        let config: Self = parse_toml(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DdfResult<()> {
        if self.historian.enabled {
            if self.historian.permission_key.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    field: "historian.permission_key".to_string(),
                }
                .into());
            }
            if self.historian.permission_value.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    field: "historian.permission_value".to_string(),
                }
                .into());
            }
        }

        self.registry.validate().map_err(|e| ConfigError::InvalidValue {
            field: "registry".to_string(),
            value: e.to_string(),
            reason: "expected key=value1,value2".to_string(),
        })?;

        let xml = &self.xml_attributes;
        if let Some(key) = xml.unions.iter().find(|key| xml.intersections.contains(key)) {
            return Err(ConfigError::IncompatibleOptions {
                option_a: format!("xml_attributes.unions[{}]", key),
                option_b: format!("xml_attributes.intersections[{}]", key),
            }
            .into());
        }
        Ok(())
    }

    /// Aggregator holding every built-in plugin, configured from `self`.
    pub fn build_aggregator(&self) -> PolicyDecisionAggregator {
        let aggregator = PolicyDecisionAggregator::new();
        aggregator.add_plugin(Arc::new(HistorianPolicyPlugin::new(self.historian.clone())));
        aggregator.add_plugin(Arc::new(RegistryPolicyPlugin::new(self.registry.clone())));
        aggregator.add_plugin(Arc::new(MetacardAttributeSecurityPolicyPlugin::new(
            &self.metacard_attributes,
        )));
        aggregator.add_plugin(Arc::new(XmlAttributeSecurityPolicyPlugin::new(&self.xml_attributes)));
        info!(plugins = ?aggregator.plugin_names(), "Built policy aggregator");
        aggregator
    }
}
