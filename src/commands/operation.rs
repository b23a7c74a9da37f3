//! The four write services and their descriptors.

use crate::error::{BridgeError, Result};
use crate::sensors::WriteCapability;
use std::str::FromStr;
use strum::{Display, EnumString, IntoStaticStr};

/// Value type a write service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    Integer,
}

/// Everything that distinguishes one write service from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Service name, also used in user-facing messages.
    pub service: &'static str,
    pub capability: WriteCapability,
    pub value_kind: ValueKind,
    /// Message key reported when the call is not risk-acknowledged.
    pub risk_message_key: &'static str,
}

const DESCRIPTORS: [OperationDescriptor; 4] = [
    OperationDescriptor {
        service: "set_power",
        capability: WriteCapability::Power,
        value_kind: ValueKind::Float,
        risk_message_key: "set_power_risk_not_acknowledged",
    },
    OperationDescriptor {
        service: "set_battery",
        capability: WriteCapability::Battery,
        value_kind: ValueKind::Integer,
        risk_message_key: "set_battery_risk_not_acknowledged",
    },
    OperationDescriptor {
        service: "set_temperature",
        capability: WriteCapability::Temperature,
        value_kind: ValueKind::Integer,
        risk_message_key: "set_temperature_risk_not_acknowledged",
    },
    OperationDescriptor {
        service: "set_humidity",
        capability: WriteCapability::Humidity,
        value_kind: ValueKind::Integer,
        risk_message_key: "set_humidity_risk_not_acknowledged",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum WriteOperation {
    SetPower = 0,
    SetBattery = 1,
    SetTemperature = 2,
    SetHumidity = 3,
}

impl WriteOperation {
    pub const ALL: [WriteOperation; 4] = [
        WriteOperation::SetPower,
        WriteOperation::SetBattery,
        WriteOperation::SetTemperature,
        WriteOperation::SetHumidity,
    ];

    pub fn descriptor(self) -> &'static OperationDescriptor {
        &DESCRIPTORS[self as usize]
    }

    /// Parse a service name such as `set_temperature`.
    pub fn from_service(service: &str) -> Result<Self> {
        WriteOperation::from_str(service)
            .map_err(|_| BridgeError::UnknownService(service.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_descriptor_table_matches_variants() {
        for operation in WriteOperation::ALL {
            let descriptor = operation.descriptor();
            assert_eq!(descriptor.service, operation.to_string());
            assert_eq!(WriteOperation::from_service(descriptor.service).unwrap(), operation);
        }
    }

    #[test]
    fn test_value_kinds() {
        assert_eq!(WriteOperation::SetPower.descriptor().value_kind, ValueKind::Float);
        for operation in [
            WriteOperation::SetBattery,
            WriteOperation::SetTemperature,
            WriteOperation::SetHumidity,
        ] {
            assert_eq!(operation.descriptor().value_kind, ValueKind::Integer);
        }
    }

    #[test]
    fn test_capabilities_are_one_to_one() {
        assert_eq!(
            WriteOperation::SetHumidity.descriptor().capability,
            WriteCapability::Humidity
        );
        let capabilities: HashSet<_> = WriteOperation::ALL
            .iter()
            .map(|op| op.descriptor().capability)
            .collect();
        assert_eq!(capabilities.len(), WriteOperation::ALL.len());
    }

    #[test]
    fn test_risk_message_keys_are_per_service() {
        assert_eq!(
            WriteOperation::SetBattery.descriptor().risk_message_key,
            "set_battery_risk_not_acknowledged"
        );
        let keys: HashSet<_> = WriteOperation::ALL
            .iter()
            .map(|op| op.descriptor().risk_message_key)
            .collect();
        assert_eq!(keys.len(), WriteOperation::ALL.len());
    }

    #[test]
    fn test_unknown_service() {
        assert!(matches!(
            WriteOperation::from_service("set_fan"),
            Err(BridgeError::UnknownService(name)) if name == "set_fan"
        ));
    }
}
