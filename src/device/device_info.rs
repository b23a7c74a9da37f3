//! Device information for the heat pump and its zone modules.
//!
//! Every sensor belongs either to the main device or, when it carries a zone
//! id, to a synthetic zone device linked to the main device.

use serde::{Deserialize, Serialize};

/// Integration domain used in device identifiers.
pub const DOMAIN: &str = "idm_heatpump";
pub const MANUFACTURER: &str = "iDM Energiesysteme";
pub const MODEL_MAIN: &str = "Navigator 2.0";
pub const MODEL_ZONE: &str = "Zone Module";

/// Context of one configured heat pump, fixed at setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryContext {
    pub entry_id: String,
    pub hostname: String,
    pub display_name: String,
}

impl EntryContext {
    pub fn new(
        entry_id: impl Into<String>,
        hostname: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            entry_id: entry_id.into(),
            hostname: hostname.into(),
            display_name: display_name.into(),
        }
    }
}

/// A device identifier (domain, id) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentifier(pub String, pub String);

impl DeviceIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(DOMAIN.to_string(), id.into())
    }

    pub fn domain(&self) -> &str {
        &self.0
    }

    pub fn id(&self) -> &str {
        &self.1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub identifier: DeviceIdentifier,
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via_device: Option<DeviceIdentifier>,
}

impl DeviceInfo {
    /// The heat pump itself.
    pub fn main(context: &EntryContext) -> Self {
        Self {
            identifier: main_device_identifier(&context.entry_id),
            name: context.display_name.clone(),
            model: MODEL_MAIN.to_string(),
            manufacturer: MANUFACTURER.to_string(),
            via_device: None,
        }
    }

    /// A zone module, shown with its 1-based number.
    pub fn zone(context: &EntryContext, zone_id: u8) -> Self {
        Self {
            identifier: zone_device_identifier(&context.entry_id, zone_id),
            name: format!("{} Zone {}", context.display_name, u16::from(zone_id) + 1),
            model: MODEL_ZONE.to_string(),
            manufacturer: MANUFACTURER.to_string(),
            via_device: Some(main_device_identifier(&context.entry_id)),
        }
    }

    /// Device for a sensor in `zone_id`, or the main device.
    pub fn for_zone(context: &EntryContext, zone_id: Option<u8>) -> Self {
        match zone_id {
            Some(zone) => Self::zone(context, zone),
            None => Self::main(context),
        }
    }
}

pub fn main_device_identifier(entry_id: &str) -> DeviceIdentifier {
    DeviceIdentifier::new(entry_id)
}

pub fn zone_device_identifier(entry_id: &str, zone_id: u8) -> DeviceIdentifier {
    DeviceIdentifier::new(format!("{}_zone_{}", entry_id, u16::from(zone_id) + 1))
}

/// Lowercase ASCII slug with `_` separators.
///
/// Common German umlauts are transliterated; other characters become
/// separators. Empty input yields `unknown`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let replacement = match c {
            'a'..='z' | '0'..='9' => Some(c.to_string()),
            'ä' => Some("a".to_string()),
            'ö' => Some("o".to_string()),
            'ü' => Some("u".to_string()),
            'ß' => Some("ss".to_string()),
            _ => None,
        };
        match replacement {
            Some(part) => {
                if pending_separator && !slug.is_empty() {
                    slug.push('_');
                }
                pending_separator = false;
                slug.push_str(&part);
            }
            None => pending_separator = true,
        }
    }

    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug
    }
}
