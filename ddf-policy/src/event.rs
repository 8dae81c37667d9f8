//! Catalog lifecycle events handed to policy plugins.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ddf_core::{DdfError, Metacard, PreconditionError, Query, ResourceRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known event property names.
pub mod properties {
    /// Whether the operation targets the local catalog only. Absent means local.
    pub const LOCAL_DESTINATION: &str = "local-destination";
}

/// Free-form properties attached to an operation.
pub type EventProperties = BTreeMap<String, Value>;

static NO_PROPERTIES: EventProperties = BTreeMap::new();

/// A point in the catalog lifecycle where policy is computed.
///
/// Every payload is borrowed; plugins cannot modify what they inspect.
#[derive(Debug, Clone, Copy)]
pub enum LifecycleEvent<'a> {
    PreCreate(&'a Metacard),
    PreUpdate { id: &'a str, metacard: &'a Metacard },
    PreDelete(&'a [Metacard]),
    PreQuery(&'a Query),
    PostQuery(&'a Metacard),
    PreResource(&'a ResourceRequest),
    PostResource(&'a Metacard),
}

impl<'a> LifecycleEvent<'a> {
    pub fn kind(&self) -> LifecycleEventKind {
        match self {
            LifecycleEvent::PreCreate(_) => LifecycleEventKind::PreCreate,
            LifecycleEvent::PreUpdate { .. } => LifecycleEventKind::PreUpdate,
            LifecycleEvent::PreDelete(_) => LifecycleEventKind::PreDelete,
            LifecycleEvent::PreQuery(_) => LifecycleEventKind::PreQuery,
            LifecycleEvent::PostQuery(_) => LifecycleEventKind::PostQuery,
            LifecycleEvent::PreResource(_) => LifecycleEventKind::PreResource,
            LifecycleEvent::PostResource(_) => LifecycleEventKind::PostResource,
        }
    }

    /// Metacards carried by the event, empty for query and resource requests.
    pub fn metacards(&self) -> &'a [Metacard] {
        match *self {
            LifecycleEvent::PreCreate(metacard)
            | LifecycleEvent::PreUpdate { metacard, .. }
            | LifecycleEvent::PostQuery(metacard)
            | LifecycleEvent::PostResource(metacard) => std::slice::from_ref(metacard),
            LifecycleEvent::PreDelete(metacards) => metacards,
            LifecycleEvent::PreQuery(_) | LifecycleEvent::PreResource(_) => &[],
        }
    }
}

/// Event discriminant without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleEventKind {
    PreCreate,
    PreUpdate,
    PreDelete,
    PreQuery,
    PostQuery,
    PreResource,
    PostResource,
}

impl LifecycleEventKind {
    pub const ALL: [LifecycleEventKind; 7] = [
        LifecycleEventKind::PreCreate,
        LifecycleEventKind::PreUpdate,
        LifecycleEventKind::PreDelete,
        LifecycleEventKind::PreQuery,
        LifecycleEventKind::PostQuery,
        LifecycleEventKind::PreResource,
        LifecycleEventKind::PostResource,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleEventKind::PreCreate => "pre-create",
            LifecycleEventKind::PreUpdate => "pre-update",
            LifecycleEventKind::PreDelete => "pre-delete",
            LifecycleEventKind::PreQuery => "pre-query",
            LifecycleEventKind::PostQuery => "post-query",
            LifecycleEventKind::PreResource => "pre-resource",
            LifecycleEventKind::PostResource => "post-resource",
        }
    }

    /// Whether the event writes to the catalog.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            LifecycleEventKind::PreCreate | LifecycleEventKind::PreUpdate | LifecycleEventKind::PreDelete
        )
    }
}

impl fmt::Display for LifecycleEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEventKind {
    type Err = DdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecycleEventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                PreconditionError::InvalidArgument {
                    field: "event".to_string(),
                    reason: format!("unknown lifecycle event '{}'", s),
                }
                .into()
            })
    }
}

/// Everything a plugin sees for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub event: LifecycleEvent<'a>,
    pub properties: &'a EventProperties,
}

impl<'a> PolicyContext<'a> {
    pub fn new(event: LifecycleEvent<'a>) -> Self {
        Self {
            event,
            properties: &NO_PROPERTIES,
        }
    }

    pub fn with_properties(event: LifecycleEvent<'a>, properties: &'a EventProperties) -> Self {
        Self { event, properties }
    }

    pub fn kind(&self) -> LifecycleEventKind {
        self.event.kind()
    }

    pub fn property(&self, name: &str) -> Option<&'a Value> {
        self.properties.get(name)
    }

    /// Whether the operation stays in the local catalog.
    ///
    /// An absent `local-destination` counts as local. Booleans and the
    /// strings `"true"`/`"false"` are understood; anything else is remote.
    pub fn is_local(&self) -> bool {
        match self.property(properties::LOCAL_DESTINATION) {
            None | Some(Value::Null) => true,
            Some(Value::Bool(local)) => *local,
            Some(Value::String(raw)) => raw.trim().eq_ignore_ascii_case("true"),
            Some(_) => false,
        }
    }
}
