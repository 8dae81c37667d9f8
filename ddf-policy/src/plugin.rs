//! Policy plugin seam.

use thiserror::Error;

use crate::event::PolicyContext;
use crate::map::PolicyResponse;

/// Deny signal raised by a plugin.
///
/// This is intentional control flow, not a failure: the aggregator stops
/// running plugins and hands the signal to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("processing stopped by {plugin}: {reason}")]
pub struct StopProcessing {
    pub plugin: String,
    pub reason: String,
}

impl StopProcessing {
    pub fn new(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }
}

/// A policy evaluator invoked at every lifecycle point.
///
/// Implementations match the events they care about and return
/// [`PolicyResponse::empty`] for the rest. They must not keep per-call state.
pub trait PolicyPlugin: Send + Sync {
    /// Name used for removal and in logs. Unique within an aggregator.
    fn name(&self) -> &str;

    fn evaluate(&self, ctx: &PolicyContext<'_>) -> Result<PolicyResponse, StopProcessing>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_processing_display() {
        let stop = StopProcessing::new("registry", "entry is locked");
        assert_eq!(stop.to_string(), "processing stopped by registry: entry is locked");
    }
}
