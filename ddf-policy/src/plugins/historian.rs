//! Restricts writes of history records to the history subsystem.

use ddf_core::{tags, ConfigCell};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::PolicyContext;
use crate::map::{PolicyMap, PolicyResponse};
use crate::plugin::{PolicyPlugin, StopProcessing};

pub const PLUGIN_NAME: &str = "historian";

const HISTORY_TAGS: [&str; 2] = [tags::REVISION, tags::DELETED];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistorianPolicyConfig {
    pub enabled: bool,
    pub permission_key: String,
    pub permission_value: String,
}

impl Default for HistorianPolicyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            permission_key: "system-history".to_string(),
            permission_value: "true".to_string(),
        }
    }
}

/// Requires the history permission for any write touching a revision or
/// deleted-record metacard.
#[derive(Debug, Default)]
pub struct HistorianPolicyPlugin {
    config: ConfigCell<HistorianPolicyConfig>,
}

impl HistorianPolicyPlugin {
    pub fn new(config: HistorianPolicyConfig) -> Self {
        Self {
            config: ConfigCell::new(config),
        }
    }

    pub fn config(&self) -> HistorianPolicyConfig {
        HistorianPolicyConfig::clone(&self.config.load())
    }

    pub fn set_config(&self, config: HistorianPolicyConfig) {
        self.config.store(config);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.config.update(|config| config.enabled = enabled);
    }
}

impl PolicyPlugin for HistorianPolicyPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>) -> Result<PolicyResponse, StopProcessing> {
        let config = self.config.load();
        if !config.enabled || !ctx.kind().is_write() {
            return Ok(PolicyResponse::empty());
        }
        let touches_history = ctx
            .event
            .metacards()
            .iter()
            .any(|metacard| metacard.has_any_tag(&HISTORY_TAGS));
        if !touches_history {
            return Ok(PolicyResponse::empty());
        }
        debug!(event = %ctx.kind(), "History metacard write requires history permission");
        Ok(PolicyResponse::operation(PolicyMap::single(
            config.permission_key.clone(),
            [config.permission_value.clone()],
        )))
    }
}
