//! Built-in policy plugins.

pub mod historian;
pub mod metacard_attribute;
pub mod registry;
pub mod xml_attribute;

pub use historian::{HistorianPolicyConfig, HistorianPolicyPlugin};
pub use metacard_attribute::{MetacardAttributePolicyConfig, MetacardAttributeSecurityPolicyPlugin};
pub use registry::{RegistryPolicyConfig, RegistryPolicyPlugin};
pub use xml_attribute::XmlAttributeSecurityPolicyPlugin;
