//! Sensor address registry.
//!
//! Built once at startup from a fixed list and shared read-only through an
//! `Arc`. Lookups by name are O(1); iteration follows registration order.

use super::address::{SensorAddress, ValueType, WriteCapability};
use super::table;
use crate::error::{BridgeError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SensorRegistry {
    addresses: Vec<SensorAddress>,
    index: HashMap<String, usize>,
}

impl SensorRegistry {
    /// Build a registry, rejecting duplicate names and write capabilities whose
    /// value type does not match the operation.
    pub fn new(addresses: Vec<SensorAddress>) -> Result<Self> {
        let mut index = HashMap::with_capacity(addresses.len());

        for (position, address) in addresses.iter().enumerate() {
            if index.insert(address.name.clone(), position).is_some() {
                return Err(BridgeError::InvalidRegistry(format!(
                    "duplicate sensor name {}",
                    address.name
                )));
            }
            Self::check_write_type(address)?;
        }

        Ok(Self { addresses, index })
    }

    /// Registry for the iDM Navigator with `zone_count` zone modules.
    pub fn heatpump(zone_count: u8) -> Result<Self> {
        Self::new(table::heatpump_sensors(zone_count))
    }

    fn check_write_type(address: &SensorAddress) -> Result<()> {
        let expected = match address.capabilities.write {
            None => return Ok(()),
            Some(WriteCapability::Power) => ValueType::Float,
            Some(_) => ValueType::Integer,
        };
        if address.value_type != expected {
            return Err(BridgeError::InvalidRegistry(format!(
                "{} is writable but has value type {:?}, expected {:?}",
                address.name, address.value_type, expected
            )));
        }
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&SensorAddress> {
        self.index
            .get(name)
            .map(|&position| &self.addresses[position])
            .ok_or_else(|| BridgeError::NotFound(name.to_string()))
    }

    pub fn all(&self) -> &[SensorAddress] {
        &self.addresses
    }

    pub fn readable(&self) -> impl Iterator<Item = &SensorAddress> {
        self.addresses.iter().filter(|a| a.capabilities.readable)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<SensorAddress> {
        vec![
            SensorAddress::float("outdoor_temp", 1000, "°C"),
            SensorAddress::integer("dhw_setpoint", 1032, Some("°C"))
                .writable(WriteCapability::Temperature),
        ]
    }

    #[test]
    fn test_resolve_returns_registered_address() {
        let registry = SensorRegistry::new(sample()).unwrap();
        for address in sample() {
            assert_eq!(registry.resolve(&address.name).unwrap(), &address);
        }
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = SensorRegistry::new(sample()).unwrap();
        let err = registry.resolve("indoor_temp").unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(name) if name == "indoor_temp"));
    }

    #[test]
    fn test_all_keeps_registration_order() {
        let registry = SensorRegistry::heatpump(2).unwrap();
        let names: Vec<_> = registry.all().iter().map(|a| a.name.clone()).collect();
        let expected: Vec<_> = table::heatpump_sensors(2).into_iter().map(|a| a.name).collect();
        assert_eq!(names, expected);
        assert_eq!(registry.len(), expected.len());
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let mut addresses = sample();
        addresses.push(SensorAddress::float("outdoor_temp", 1002, "°C"));
        assert!(matches!(
            SensorRegistry::new(addresses),
            Err(BridgeError::InvalidRegistry(_))
        ));
    }

    #[test]
    fn test_rejects_mistyped_write_capability() {
        let addresses = vec![
            SensorAddress::integer("pv_power", 74, Some("kW")).writable(WriteCapability::Power),
        ];
        assert!(matches!(
            SensorRegistry::new(addresses),
            Err(BridgeError::InvalidRegistry(_))
        ));

        let addresses = vec![
            SensorAddress::float("dhw", 1032, "°C").writable(WriteCapability::Temperature),
        ];
        assert!(SensorRegistry::new(addresses).is_err());
    }

    #[test]
    fn test_heatpump_table_is_valid() {
        let registry = SensorRegistry::heatpump(table::MAX_ZONES).unwrap();
        assert!(!registry.is_empty());
        assert_eq!(registry.readable().count(), registry.len());
    }
}
