//! Permission strings of the form `key=value1,value2`.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::warn;

use crate::map::PolicyMap;

/// Rejected permission string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionParseError {
    #[error("permission '{0}' has no '=' separator")]
    MissingSeparator(String),

    #[error("permission '{0}' has an empty key")]
    EmptyKey(String),

    #[error("permission '{0}' has no values")]
    NoValues(String),
}

/// Parse one `key=value1,value2` string.
///
/// Whitespace around the key and each value is trimmed; empty values are
/// dropped.
pub fn parse_permission(raw: &str) -> Result<(String, BTreeSet<String>), PermissionParseError> {
    let (key, values) = raw
        .split_once('=')
        .ok_or_else(|| PermissionParseError::MissingSeparator(raw.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(PermissionParseError::EmptyKey(raw.to_string()));
    }
    let values: BTreeSet<String> = values
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();
    if values.is_empty() {
        return Err(PermissionParseError::NoValues(raw.to_string()));
    }
    Ok((key.to_string(), values))
}

/// Parse every string in `raw`, failing on the first malformed one.
pub fn parse_permissions_strict<S: AsRef<str>>(raw: &[S]) -> Result<PolicyMap, PermissionParseError> {
    raw.iter()
        .map(|entry| parse_permission(entry.as_ref()))
        .collect::<Result<PolicyMap, _>>()
}

/// Parse every string in `raw`, skipping malformed ones with a warning.
///
/// Repeated keys are merged.
pub fn parse_permissions<S: AsRef<str>>(raw: &[S]) -> PolicyMap {
    let mut policy = PolicyMap::new();
    for entry in raw {
        match parse_permission(entry.as_ref()) {
            Ok((key, values)) => policy.extend_key(key, values),
            Err(e) => warn!(error = %e, "Skipping malformed permission string"),
        }
    }
    policy
}
