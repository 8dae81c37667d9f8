//! Runs the registered policy plugins for an event and merges what they return.

use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::event::PolicyContext;
use crate::map::PolicyResponse;
use crate::plugin::{PolicyPlugin, StopProcessing};

type PluginList = Arc<Vec<Arc<dyn PolicyPlugin>>>;

/// Ordered set of policy plugins.
///
/// Responses are combined by per-key union, so plugin order never changes
/// the merged result. The one exception is [`StopProcessing`]: the first
/// plugin that raises it wins and later plugins are not run.
///
/// Registration swaps in a new plugin list; an evaluation already in flight
/// keeps the list it started with.
#[derive(Default)]
pub struct PolicyDecisionAggregator {
    plugins: RwLock<PluginList>,
}

impl PolicyDecisionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugins(plugins: Vec<Arc<dyn PolicyPlugin>>) -> Self {
        Self {
            plugins: RwLock::new(Arc::new(plugins)),
        }
    }

    /// Register `plugin`, replacing any plugin with the same name.
    pub fn add_plugin(&self, plugin: Arc<dyn PolicyPlugin>) {
        let mut guard = self.plugins.write().unwrap_or_else(|e| e.into_inner());
        let mut next: Vec<_> = guard
            .iter()
            .filter(|existing| existing.name() != plugin.name())
            .cloned()
            .collect();
        info!(plugin = plugin.name(), "Registered policy plugin");
        next.push(plugin);
        *guard = Arc::new(next);
    }

    /// Unregister the plugin called `name`. Returns whether one was removed.
    pub fn remove_plugin(&self, name: &str) -> bool {
        let mut guard = self.plugins.write().unwrap_or_else(|e| e.into_inner());
        let before = guard.len();
        let next: Vec<_> = guard.iter().filter(|p| p.name() != name).cloned().collect();
        let removed = next.len() != before;
        if removed {
            info!(plugin = name, "Unregistered policy plugin");
            *guard = Arc::new(next);
        }
        removed
    }

    /// Snapshot of the registered plugins.
    pub fn plugins(&self) -> PluginList {
        let guard = self.plugins.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins().iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate every plugin for `ctx` and union their responses.
    pub fn evaluate(&self, ctx: &PolicyContext<'_>) -> Result<PolicyResponse, StopProcessing> {
        let plugins = self.plugins();
        let mut merged = PolicyResponse::empty();
        for plugin in plugins.iter() {
            match plugin.evaluate(ctx) {
                Ok(response) => merged.merge(response),
                Err(stop) => {
                    info!(plugin = plugin.name(), event = %ctx.kind(), reason = %stop.reason, "Policy plugin stopped processing");
                    return Err(stop);
                }
            }
        }
        debug!(
            event = %ctx.kind(),
            plugins = plugins.len(),
            item_keys = merged.item_policy.len(),
            operation_keys = merged.operation_policy.len(),
            "Policy evaluated"
        );
        Ok(merged)
    }
}

impl std::fmt::Debug for PolicyDecisionAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyDecisionAggregator")
            .field("plugins", &self.plugin_names())
            .finish()
    }
}
