//! Metacard data model
//!
//! A metacard is the catalog's canonical metadata record: an identity, a set of
//! classification tags, an optional resource URI and an open map of attribute
//! name to one or more typed values. The names in [`core_attributes`] form the
//! fixed core schema; any other key is an extension attribute.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::identity::{ContentHash, MetacardId};

/// Core attribute names shared by every metacard type.
pub mod core_attributes {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const TAGS: &str = "metacard-tags";
    pub const MODIFIED: &str = "modified";
    pub const CHECKSUM: &str = "checksum";
    pub const METADATA: &str = "metadata";
    pub const RESOURCE_URI: &str = "resource-uri";
    pub const RESOURCE_SIZE: &str = "resource-size";
    pub const SECURITY_ACCESS_GROUPS: &str = "security.access-groups";
    pub const REGISTRY_ID: &str = "registry.registry-id";
}

/// Well-known values of the `metacard-tags` attribute.
pub mod tags {
    /// Default tag for ordinary resource records.
    pub const RESOURCE: &str = "resource";
    /// Historical revision of another metacard.
    pub const REVISION: &str = "revision";
    /// Tombstone left behind by a delete when history is enabled.
    pub const DELETED: &str = "deleted";
    /// Local registry entry.
    pub const REGISTRY: &str = "registry";
    /// Registry entry mirrored from a remote registry.
    pub const REGISTRY_REMOTE: &str = "registry-remote";
}

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AttributeValue {
    String(String),
    Date(DateTime<Utc>),
    Binary(Vec<u8>),
    /// Well-known-text geometry.
    Geometry(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
}

impl AttributeValue {
    /// Borrow the value as a string slice if it is textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) | AttributeValue::Geometry(s) => Some(s),
            _ => None,
        }
    }

    fn discriminant(&self) -> u8 {
        match self {
            AttributeValue::String(_) => 0,
            AttributeValue::Date(_) => 1,
            AttributeValue::Binary(_) => 2,
            AttributeValue::Geometry(_) => 3,
            AttributeValue::Long(_) => 4,
            AttributeValue::Double(_) => 5,
            AttributeValue::Boolean(_) => 6,
        }
    }

    fn feed(&self, hasher: &mut Sha256) {
        hasher.update([self.discriminant()]);
        match self {
            AttributeValue::String(s) | AttributeValue::Geometry(s) => feed_bytes(hasher, s.as_bytes()),
            AttributeValue::Date(d) => {
                hasher.update(d.timestamp().to_be_bytes());
                hasher.update(d.timestamp_subsec_nanos().to_be_bytes());
            }
            AttributeValue::Binary(b) => feed_bytes(hasher, b),
            AttributeValue::Long(v) => hasher.update(v.to_be_bytes()),
            AttributeValue::Double(v) => hasher.update(v.to_bits().to_be_bytes()),
            AttributeValue::Boolean(v) => hasher.update([u8::from(*v)]),
        }
    }
}

/// String rendering used when attribute values feed policy maps.
///
/// Dates render as RFC 3339 with millisecond precision, binaries as lowercase hex.
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) | AttributeValue::Geometry(s) => f.write_str(s),
            AttributeValue::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            AttributeValue::Binary(b) => f.write_str(&hex::encode(b)),
            AttributeValue::Long(v) => write!(f, "{}", v),
            AttributeValue::Double(v) => write!(f, "{}", v),
            AttributeValue::Boolean(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttributeValue::Date(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Long(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self {
        AttributeValue::Binary(value)
    }
}

/// Canonical metadata record for an ingested item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Metacard {
    pub id: MetacardId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_uri: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<AttributeValue>>,
}

impl Metacard {
    /// Create an empty metacard with the given id.
    pub fn new(id: impl Into<MetacardId>) -> Self {
        Self {
            id: id.into(),
            source_id: None,
            tags: BTreeSet::new(),
            resource_uri: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_resource_uri(mut self, uri: impl Into<String>) -> Self {
        self.resource_uri = Some(uri.into());
        self
    }

    /// Add an attribute, replacing any previous values under the same name.
    pub fn with_attribute<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<AttributeValue>,
    {
        self.set_attribute(name, values);
        self
    }

    /// Replace the values stored under `name`.
    pub fn set_attribute<I, V>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<AttributeValue>,
    {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
    }

    /// Values stored under `name`, if any.
    pub fn attribute(&self, name: &str) -> Option<&[AttributeValue]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    /// First textual value stored under `name`.
    pub fn first_str(&self, name: &str) -> Option<&str> {
        self.attribute(name)?.iter().find_map(AttributeValue::as_str)
    }

    /// Effective tags. An untagged metacard is an ordinary resource record.
    pub fn effective_tags(&self) -> BTreeSet<&str> {
        if self.tags.is_empty() {
            std::iter::once(tags::RESOURCE).collect()
        } else {
            self.tags.iter().map(String::as_str).collect()
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.effective_tags().contains(tag)
    }

    pub fn has_any_tag(&self, candidates: &[&str]) -> bool {
        let effective = self.effective_tags();
        candidates.iter().any(|tag| effective.contains(tag))
    }

    /// Last modification stamp.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.attribute(core_attributes::MODIFIED)?
            .iter()
            .find_map(|value| match value {
                AttributeValue::Date(d) => Some(*d),
                _ => None,
            })
    }

    pub fn checksum(&self) -> Option<&str> {
        self.first_str(core_attributes::CHECKSUM)
    }

    /// Inline XML metadata.
    pub fn metadata(&self) -> Option<&str> {
        self.first_str(core_attributes::METADATA)
    }

    /// Declared resource size in bytes.
    pub fn resource_size(&self) -> Option<u64> {
        self.attribute(core_attributes::RESOURCE_SIZE)?
            .iter()
            .find_map(|value| match value {
                AttributeValue::Long(v) => u64::try_from(*v).ok(),
                AttributeValue::String(s) => s.trim().parse().ok(),
                _ => None,
            })
    }

    /// True when the id is empty or whitespace.
    pub fn has_blank_id(&self) -> bool {
        self.id.trim().is_empty()
    }

    /// SHA-256 over every field of the metacard.
    ///
    /// Each field is length-prefixed so distinct metacards cannot share an
    /// encoding. Stable across processes: it depends only on content.
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = Sha256::new();
        feed_bytes(&mut hasher, self.id.as_bytes());
        feed_optional(&mut hasher, self.source_id.as_deref());
        hasher.update((self.tags.len() as u64).to_be_bytes());
        for tag in &self.tags {
            feed_bytes(&mut hasher, tag.as_bytes());
        }
        feed_optional(&mut hasher, self.resource_uri.as_deref());
        hasher.update((self.attributes.len() as u64).to_be_bytes());
        for (name, values) in &self.attributes {
            feed_bytes(&mut hasher, name.as_bytes());
            hasher.update((values.len() as u64).to_be_bytes());
            for value in values {
                value.feed(&mut hasher);
            }
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&hasher.finalize());
        hash
    }
}

fn feed_bytes(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

fn feed_optional(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update([1u8]);
            feed_bytes(hasher, v.as_bytes());
        }
        None => hasher.update([0u8]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_untagged_metacard_is_resource() {
        let metacard = Metacard::new("abc");
        assert!(metacard.has_tag(tags::RESOURCE));
        assert!(!metacard.has_tag(tags::REGISTRY));

        let registry = Metacard::new("abc").with_tag(tags::REGISTRY);
        assert!(registry.has_tag(tags::REGISTRY));
        assert!(!registry.has_tag(tags::RESOURCE));
    }

    #[test]
    fn test_attribute_accessors() {
        let modified = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let metacard = Metacard::new("abc")
            .with_attribute(core_attributes::MODIFIED, [modified])
            .with_attribute(core_attributes::CHECKSUM, ["deadbeef"])
            .with_attribute(core_attributes::RESOURCE_SIZE, [42i64])
            .with_attribute(core_attributes::METADATA, ["<doc/>"]);

        assert_eq!(metacard.modified(), Some(modified));
        assert_eq!(metacard.checksum(), Some("deadbeef"));
        assert_eq!(metacard.resource_size(), Some(42));
        assert_eq!(metacard.metadata(), Some("<doc/>"));
        assert!(metacard.attribute("missing").is_none());
    }

    #[test]
    fn test_display_renders_policy_strings() {
        let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(AttributeValue::from(date).to_string(), "2024-01-02T03:04:05.000Z");
        assert_eq!(AttributeValue::Binary(vec![0xde, 0xad]).to_string(), "dead");
        assert_eq!(AttributeValue::Long(7).to_string(), "7");
        assert_eq!(AttributeValue::Boolean(true).to_string(), "true");
        assert_eq!(
            AttributeValue::Geometry("POINT (1 2)".into()).to_string(),
            "POINT (1 2)"
        );
    }

    #[test]
    fn test_blank_id_detection() {
        assert!(Metacard::new("").has_blank_id());
        assert!(Metacard::new("  ").has_blank_id());
        assert!(!Metacard::new("x").has_blank_id());
    }

    #[test]
    fn test_content_hash_tracks_every_field() {
        let base = Metacard::new("abc").with_attribute("title", ["Report"]);
        let same = Metacard::new("abc").with_attribute("title", ["Report"]);
        assert_eq!(base.content_hash(), same.content_hash());

        let retitled = Metacard::new("abc").with_attribute("title", ["Other"]);
        assert_ne!(base.content_hash(), retitled.content_hash());

        let tagged = base.clone().with_tag(tags::REVISION);
        assert_ne!(base.content_hash(), tagged.content_hash());

        let sourced = base.clone().with_source("ddf.distribution");
        assert_ne!(base.content_hash(), sourced.content_hash());
    }

    #[test]
    fn test_content_hash_tracks_dates_beyond_nanosecond_range() {
        let far = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap();
        let farther = Utc.with_ymd_and_hms(2400, 1, 1, 0, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(1600, 1, 1, 0, 0, 0).unwrap();
        let at = |d: DateTime<Utc>| Metacard::new("abc").with_attribute(core_attributes::MODIFIED, [d]);

        assert_ne!(at(far).content_hash(), at(farther).content_hash());
        assert_ne!(at(early).content_hash(), at(far).content_hash());
        assert_eq!(at(farther).content_hash(), at(farther).content_hash());
    }

    #[test]
    fn test_content_hash_distinguishes_value_types() {
        let text = Metacard::new("abc").with_attribute("n", ["1"]);
        let long = Metacard::new("abc").with_attribute("n", [1i64]);
        assert_ne!(text.content_hash(), long.content_hash());
    }

    #[test]
    fn test_json_roundtrip_keeps_typed_values() {
        let metacard = Metacard::new("abc")
            .with_tag(tags::RESOURCE)
            .with_attribute("count", [3i64])
            .with_attribute("flag", [false]);
        let json = serde_json::to_string(&metacard).unwrap();
        assert!(json.contains("\"type\":\"long\""));
        let decoded: Metacard = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, metacard);
    }
}
