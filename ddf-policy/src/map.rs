//! Policy maps and the two-map plugin response.

use std::collections::{btree_map, BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute name to set of allowed values.
///
/// Merging is a per-key set union, so it is commutative, associative and
/// idempotent. A key that is absent contributes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyMap(BTreeMap<String, BTreeSet<String>>);

impl PolicyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-key policy.
    pub fn single<I, V>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut map = Self::new();
        map.extend_key(key, values);
        map
    }

    /// Add values under `key`, keeping whatever is already there.
    pub fn extend_key<I, V>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.0
            .entry(key.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    /// Replace the set under `key`.
    pub fn insert(&mut self, key: impl Into<String>, values: BTreeSet<String>) {
        self.0.insert(key.into(), values);
    }

    /// Union `other` into `self`.
    pub fn merge(&mut self, other: PolicyMap) {
        for (key, values) in other.0 {
            match self.0.entry(key) {
                btree_map::Entry::Occupied(mut slot) => slot.get_mut().extend(values),
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(values);
                }
            }
        }
    }

    /// Union of `self` and `other`.
    pub fn union(mut self, other: PolicyMap) -> Self {
        self.merge(other);
        self
    }

    pub fn get(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, BTreeSet<String>> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, BTreeSet<String>> {
        self.0
    }
}

impl From<BTreeMap<String, BTreeSet<String>>> for PolicyMap {
    fn from(map: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, BTreeSet<String>)> for PolicyMap {
    fn from_iter<T: IntoIterator<Item = (String, BTreeSet<String>)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (key, values) in iter {
            map.extend_key(key, values);
        }
        map
    }
}

impl IntoIterator for PolicyMap {
    type Item = (String, BTreeSet<String>);
    type IntoIter = btree_map::IntoIter<String, BTreeSet<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PolicyMap {
    type Item = (&'a String, &'a BTreeSet<String>);
    type IntoIter = btree_map::Iter<'a, String, BTreeSet<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for PolicyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, values) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            let joined: Vec<&str> = values.iter().map(String::as_str).collect();
            write!(f, "{}={}", key, joined.join(","))?;
        }
        Ok(())
    }
}

/// What a plugin contributes for one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResponse {
    /// Constraints on the individual record.
    pub item_policy: PolicyMap,
    /// Constraints on the whole operation.
    pub operation_policy: PolicyMap,
}

impl PolicyResponse {
    pub fn new(item_policy: PolicyMap, operation_policy: PolicyMap) -> Self {
        Self {
            item_policy,
            operation_policy,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn item(item_policy: PolicyMap) -> Self {
        Self::new(item_policy, PolicyMap::new())
    }

    pub fn operation(operation_policy: PolicyMap) -> Self {
        Self::new(PolicyMap::new(), operation_policy)
    }

    pub fn is_empty(&self) -> bool {
        self.item_policy.is_empty() && self.operation_policy.is_empty()
    }

    /// Union both maps of `other` into `self`.
    pub fn merge(&mut self, other: PolicyResponse) {
        self.item_policy.merge(other.item_policy);
        self.operation_policy.merge(other.operation_policy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_unions_per_key() {
        let mut a = PolicyMap::single("role", ["user"]);
        a.merge(PolicyMap::single("role", ["admin"]));
        a.merge(PolicyMap::single("country", ["USA"]));

        let roles: Vec<&str> = a.get("role").unwrap().iter().map(String::as_str).collect();
        assert_eq!(roles, vec!["admin", "user"]);
        assert!(a.contains_key("country"));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_merge_keeps_empty_sets() {
        let mut a = PolicyMap::new();
        a.insert("unsatisfiable", BTreeSet::new());
        a.merge(PolicyMap::new());
        assert_eq!(a.get("unsatisfiable"), Some(&BTreeSet::new()));
    }

    #[test]
    fn test_display() {
        let map = PolicyMap::single("role", ["user", "admin"]).union(PolicyMap::single("a", ["x"]));
        assert_eq!(map.to_string(), "a=x; role=admin,user");
    }

    #[test]
    fn test_response_merge() {
        let mut response = PolicyResponse::item(PolicyMap::single("role", ["user"]));
        response.merge(PolicyResponse::operation(PolicyMap::single("system-history", ["true"])));
        assert!(!response.is_empty());
        assert!(response.item_policy.contains_key("role"));
        assert!(response.operation_policy.contains_key("system-history"));
        assert!(PolicyResponse::empty().is_empty());
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let map = PolicyMap::single("role", ["user"]);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({"role": ["user"]}));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_map() -> impl Strategy<Value = PolicyMap> {
        prop::collection::btree_map(
            "[a-c]",
            prop::collection::btree_set("[a-e]", 0..4),
            0..4,
        )
        .prop_map(PolicyMap::from)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_merge_commutative(a in arb_map(), b in arb_map()) {
            prop_assert_eq!(a.clone().union(b.clone()), b.union(a));
        }

        #[test]
        fn prop_merge_associative(a in arb_map(), b in arb_map(), c in arb_map()) {
            let left = a.clone().union(b.clone()).union(c.clone());
            let right = a.union(b.union(c));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn prop_merge_idempotent(a in arb_map()) {
            prop_assert_eq!(a.clone().union(a.clone()), a);
        }

        #[test]
        fn prop_merge_never_narrows(a in arb_map(), b in arb_map()) {
            let merged = a.clone().union(b);
            for (key, values) in &a {
                let merged_values = merged.get(key).unwrap();
                prop_assert!(values.is_subset(merged_values));
            }
        }
    }
}
