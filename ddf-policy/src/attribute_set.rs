//! Attribute set evaluation: metacard attribute values as policy sets.

use std::collections::BTreeSet;

use ddf_core::Metacard;
use serde::{Deserialize, Serialize};

use crate::map::PolicyMap;

/// Maps configured attribute names to the values a metacard holds for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AttributeSetEvaluator {
    attributes: Vec<String>,
}

impl AttributeSetEvaluator {
    /// Build an evaluator over `attributes`. Repeated names are ignored.
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        let attributes = attributes
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| !name.trim().is_empty() && seen.insert(name.clone()))
            .collect();
        Self { attributes }
    }

    /// Configured attribute names, first occurrence order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Every value of every configured attribute present on `metacard`.
    ///
    /// Values that render to an empty string are dropped. A configured
    /// attribute the metacard lacks, or holds with no non-empty value,
    /// produces no key at all, not an empty set.
    pub fn evaluate(&self, metacard: &Metacard) -> PolicyMap {
        let mut policy = PolicyMap::new();
        for name in &self.attributes {
            let Some(values) = metacard.attribute(name) else {
                continue;
            };
            let rendered: Vec<String> = values
                .iter()
                .map(|value| value.to_string())
                .filter(|value| !value.is_empty())
                .collect();
            if rendered.is_empty() {
                continue;
            }
            policy.extend_key(name.clone(), rendered);
        }
        policy
    }

    /// Union of [`evaluate`](Self::evaluate) over `metacards`.
    pub fn evaluate_all<'a, I>(&self, metacards: I) -> PolicyMap
    where
        I: IntoIterator<Item = &'a Metacard>,
    {
        metacards
            .into_iter()
            .fold(PolicyMap::new(), |acc, metacard| acc.union(self.evaluate(metacard)))
    }
}

impl From<Vec<String>> for AttributeSetEvaluator {
    fn from(attributes: Vec<String>) -> Self {
        Self::new(attributes)
    }
}

impl From<AttributeSetEvaluator> for Vec<String> {
    fn from(evaluator: AttributeSetEvaluator) -> Self {
        evaluator.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ddf_core::AttributeValue;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parsed_security_scenario() {
        let metacard = Metacard::new("abc").with_attribute("parsed.security", ["A", "B", "C"]);
        let evaluator = AttributeSetEvaluator::new(["parsed.security", "parsed.other"]);

        let policy = evaluator.evaluate(&metacard);
        assert_eq!(policy.len(), 1);
        assert_eq!(policy.get("parsed.security"), Some(&set(&["A", "B", "C"])));
        assert!(!policy.contains_key("parsed.other"));
    }

    #[test]
    fn test_empty_configuration_is_noop() {
        let metacard = Metacard::new("abc").with_attribute("parsed.security", ["A"]);
        let evaluator = AttributeSetEvaluator::new(Vec::<String>::new());
        assert!(evaluator.is_empty());
        assert!(evaluator.evaluate(&metacard).is_empty());
    }

    #[test]
    fn test_duplicates_and_blanks_ignored() {
        let evaluator = AttributeSetEvaluator::new(["a", "b", "a", " ", "b"]);
        assert_eq!(evaluator.attributes(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_attribute_without_values_produces_no_key() {
        let metacard = Metacard::new("abc").with_attribute("empty", Vec::<String>::new());
        let evaluator = AttributeSetEvaluator::new(["empty"]);
        assert!(evaluator.evaluate(&metacard).is_empty());
    }

    #[test]
    fn test_empty_values_are_not_policy_values() {
        let metacard = Metacard::new("abc")
            .with_attribute("blank", [""])
            .with_attribute("mixed", ["", "ops"])
            .with_attribute("blob", [AttributeValue::Binary(Vec::new())]);
        let policy = AttributeSetEvaluator::new(["blank", "mixed", "blob"]).evaluate(&metacard);

        assert!(!policy.contains_key("blank"));
        assert!(!policy.contains_key("blob"));
        assert_eq!(policy.get("mixed"), Some(&set(&["ops"])));
    }

    #[test]
    fn test_typed_values_rendered() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let metacard = Metacard::new("abc")
            .with_attribute("when", [AttributeValue::from(date)])
            .with_attribute("size", [AttributeValue::from(42i64)])
            .with_attribute("blob", [AttributeValue::from(vec![0xde, 0xad])]);
        let policy = AttributeSetEvaluator::new(["when", "size", "blob"]).evaluate(&metacard);

        assert_eq!(policy.get("when"), Some(&set(&["2024-05-01T12:00:00.000Z"])));
        assert_eq!(policy.get("size"), Some(&set(&["42"])));
        assert_eq!(policy.get("blob"), Some(&set(&["dead"])));
    }

    #[test]
    fn test_evaluate_all_unions() {
        let a = Metacard::new("a").with_attribute("role", ["user"]);
        let b = Metacard::new("b").with_attribute("role", ["admin"]);
        let policy = AttributeSetEvaluator::new(["role"]).evaluate_all([&a, &b]);
        assert_eq!(policy.get("role"), Some(&set(&["admin", "user"])));
    }

    #[test]
    fn test_deserializes_from_list() {
        let evaluator: AttributeSetEvaluator = serde_json::from_str(r#"["a","a","b"]"#).unwrap();
        assert_eq!(evaluator.attributes().len(), 2);
    }
}
