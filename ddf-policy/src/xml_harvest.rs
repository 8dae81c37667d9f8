//! Security attribute harvesting from inline XML metadata.

use std::collections::{BTreeMap, BTreeSet};

use ddf_core::Metacard;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::map::PolicyMap;

/// Which elements to scrape and how to combine repeated attribute keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XmlAttributeHarvesterConfig {
    /// Element local names to scrape. Case-sensitive.
    pub elements: Vec<String>,
    /// Attribute keys whose values are unioned across elements.
    pub unions: Vec<String>,
    /// Attribute keys whose values are intersected across elements.
    pub intersections: Vec<String>,
}

/// Scrapes the attributes of selected XML elements into a policy map.
///
/// Every attribute on a matching element becomes a key; its value is split
/// on whitespace. Keys listed in `intersections` keep only the values common
/// to every matching element, all other keys take the union. An intersection
/// that ends up empty stays in the map as an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlAttributeHarvester {
    elements: BTreeSet<String>,
    intersections: BTreeSet<String>,
    unions: BTreeSet<String>,
}

impl XmlAttributeHarvester {
    pub fn new(config: &XmlAttributeHarvesterConfig) -> Self {
        let clean = |names: &[String]| -> BTreeSet<String> {
            names
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        };
        Self {
            elements: clean(&config.elements),
            intersections: clean(&config.intersections),
            unions: clean(&config.unions),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &BTreeSet<String> {
        &self.elements
    }

    pub fn unions(&self) -> &BTreeSet<String> {
        &self.unions
    }

    pub fn intersections(&self) -> &BTreeSet<String> {
        &self.intersections
    }

    /// Harvest the `metadata` attribute of `metacard`.
    ///
    /// Missing metadata and malformed XML both yield an empty map.
    pub fn evaluate(&self, metacard: &Metacard) -> PolicyMap {
        if self.is_empty() {
            return PolicyMap::new();
        }
        let Some(xml) = metacard.metadata() else {
            debug!(metacard_id = %metacard.id, "No XML metadata to harvest");
            return PolicyMap::new();
        };
        match self.try_harvest(xml) {
            Ok(policy) => policy,
            Err(e) => {
                warn!(metacard_id = %metacard.id, error = %e, "Malformed XML metadata, skipping harvest");
                PolicyMap::new()
            }
        }
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

    /// Harvest `xml`, returning the parser error on malformed input.
    pub fn try_harvest(&self, xml: &str) -> Result<PolicyMap, quick_xml::Error> {
        let mut combined: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        if self.is_empty() {
            return Ok(PolicyMap::new());
        }

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event()? {
                Event::Start(e) | Event::Empty(e) => {
                    if self.matches(&e) {
                        self.absorb(&e, &mut combined)?;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(PolicyMap::from(combined))
    }

    fn matches(&self, element: &BytesStart<'_>) -> bool {
        let local_name = element.local_name();
        std::str::from_utf8(local_name.as_ref())
            .map(|name| self.elements.contains(name))
            .unwrap_or(false)
    }

    fn absorb(
        &self,
        element: &BytesStart<'_>,
        combined: &mut BTreeMap<String, BTreeSet<String>>,
    ) -> Result<(), quick_xml::Error> {
        for attr in element.attributes() {
            let attr = attr?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
            let raw = attr.unescape_value()?;
            let values: BTreeSet<String> = raw.split_whitespace().map(str::to_string).collect();

            if self.intersections.contains(&key) {
                match combined.get_mut(&key) {
                    Some(existing) => existing.retain(|value| values.contains(value)),
                    None => {
                        combined.insert(key, values);
                    }
                }
            } else {
                combined.entry(key).or_default().extend(values);
            }
        }
        Ok(())
    }
}

impl From<XmlAttributeHarvesterConfig> for XmlAttributeHarvester {
    fn from(config: XmlAttributeHarvesterConfig) -> Self {
        Self::new(&config)
    }
}
