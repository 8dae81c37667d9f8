//! Access control for registry entries.
//!
//! Registry metacards describe federated nodes. Writes and reads of them are
//! gated by configured permissions, and the registry can be switched off or
//! restricted to (or away from) a list of registry ids, in which case the
//! bypass permission is required instead.

use ddf_core::{core_attributes, tags, ConfigCell, Metacard};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{LifecycleEvent, PolicyContext};
use crate::map::{PolicyMap, PolicyResponse};
use crate::permission::{parse_permissions, parse_permissions_strict, PermissionParseError};
use crate::plugin::{PolicyPlugin, StopProcessing};

pub const PLUGIN_NAME: &str = "registry";

const REGISTRY_TAGS: [&str; 2] = [tags::REGISTRY, tags::REGISTRY_REMOTE];

/// Registry policy settings. Permissions are `key=value1,value2` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryPolicyConfig {
    pub registry_disabled: bool,
    /// When true `registry_entry_ids` is an allow list, otherwise a block list.
    pub white_list: bool,
    pub registry_entry_ids: Vec<String>,
    pub bypass_access: Vec<String>,
    pub create_access: Vec<String>,
    pub update_access: Vec<String>,
    pub delete_access: Vec<String>,
    pub read_access: Vec<String>,
}

impl RegistryPolicyConfig {
    /// Check that every permission string parses.
    pub fn validate(&self) -> Result<(), PermissionParseError> {
        for raw in [
            &self.bypass_access,
            &self.create_access,
            &self.update_access,
            &self.delete_access,
            &self.read_access,
        ] {
            parse_permissions_strict(raw)?;
        }
        Ok(())
    }
}

/// Parsed form of [`RegistryPolicyConfig`], swapped in as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RegistryRules {
    config: RegistryPolicyConfig,
    bypass: PolicyMap,
    create: PolicyMap,
    update: PolicyMap,
    delete: PolicyMap,
    read: PolicyMap,
}

impl RegistryRules {
    fn from_config(config: &RegistryPolicyConfig) -> Self {
        Self {
            config: config.clone(),
            bypass: parse_permissions(&config.bypass_access),
            create: parse_permissions(&config.create_access),
            update: parse_permissions(&config.update_access),
            delete: parse_permissions(&config.delete_access),
            read: parse_permissions(&config.read_access),
        }
    }

    /// Whether the id list keeps this registry entry out.
    fn is_blocked(&self, metacard: &Metacard) -> bool {
        let Some(registry_id) = metacard.first_str(core_attributes::REGISTRY_ID) else {
            return false;
        };
        let listed = self.config.registry_entry_ids.iter().any(|id| id == registry_id);
        if self.config.white_list {
            !listed
        } else {
            listed
        }
    }

    /// Policy for one metacard under `access`, or nothing when out of scope.
    fn policy_for(&self, ctx: &PolicyContext<'_>, metacard: &Metacard, access: &PolicyMap) -> PolicyMap {
        if !metacard.has_any_tag(&REGISTRY_TAGS) || !ctx.is_local() {
            return PolicyMap::new();
        }
        if self.config.registry_disabled || self.is_blocked(metacard) {
            debug!(metacard_id = %metacard.id, "Registry entry requires bypass permission");
            self.bypass.clone()
        } else {
            access.clone()
        }
    }
}

/// Policy plugin for registry metacards.
#[derive(Debug, Default)]
pub struct RegistryPolicyPlugin {
    rules: ConfigCell<RegistryRules>,
}

impl RegistryPolicyPlugin {
    pub fn new(config: RegistryPolicyConfig) -> Self {
        Self {
            rules: ConfigCell::new(RegistryRules::from_config(&config)),
        }
    }

    pub fn config(&self) -> RegistryPolicyConfig {
        self.rules.load().config.clone()
    }

    /// Replace the configuration. Malformed permission strings are skipped.
    pub fn set_config(&self, config: RegistryPolicyConfig) {
        self.rules.store(RegistryRules::from_config(&config));
    }

    pub fn set_registry_disabled(&self, disabled: bool) {
        self.rules.update(|rules| {
            rules.config.registry_disabled = disabled;
        });
    }

    pub fn set_registry_entry_ids(&self, ids: Vec<String>, white_list: bool) {
        self.rules.update(|rules| {
            rules.config.registry_entry_ids = ids;
            rules.config.white_list = white_list;
        });
    }
}

impl PolicyPlugin for RegistryPolicyPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn evaluate(&self, ctx: &PolicyContext<'_>) -> Result<PolicyResponse, StopProcessing> {
        let rules = self.rules.load();
        let response = match ctx.event {
            LifecycleEvent::PreCreate(metacard) => {
                PolicyResponse::operation(rules.policy_for(ctx, metacard, &rules.create))
            }
            LifecycleEvent::PreUpdate { metacard, .. } => {
                PolicyResponse::operation(rules.policy_for(ctx, metacard, &rules.update))
            }
            LifecycleEvent::PreDelete(metacards) => PolicyResponse::operation(
                metacards
                    .iter()
                    .fold(PolicyMap::new(), |acc, metacard| {
                        acc.union(rules.policy_for(ctx, metacard, &rules.delete))
                    }),
            ),
            LifecycleEvent::PostQuery(metacard) | LifecycleEvent::PostResource(metacard) => {
                PolicyResponse::item(rules.policy_for(ctx, metacard, &rules.read))
            }
            LifecycleEvent::PreQuery(_) | LifecycleEvent::PreResource(_) => PolicyResponse::empty(),
        };
        Ok(response)
    }
}
