//! Sensor address descriptors.
//!
//! A [`SensorAddress`] identifies one heat pump data point: its name, the
//! zone it belongs to, what it can do and how its value is encoded in the
//! Modbus register map.

use std::ops::RangeInclusive;
use strum::{Display, IntoStaticStr};

/// The single write operation a sensor address can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum WriteCapability {
    Power,
    Battery,
    Temperature,
    Humidity,
}

/// Read/write capabilities of a sensor address.
///
/// `write` is a single optional variant, so an address can never support more
/// than one write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub readable: bool,
    pub write: Option<WriteCapability>,
}

impl Capabilities {
    pub const READ_ONLY: Self = Self {
        readable: true,
        write: None,
    };

    pub const fn read_write(capability: WriteCapability) -> Self {
        Self {
            readable: true,
            write: Some(capability),
        }
    }

    pub fn supports(&self, capability: WriteCapability) -> bool {
        self.write == Some(capability)
    }
}

/// One named state of an enumerated register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumVariant {
    pub raw: u16,
    pub label: &'static str,
}

/// Logical type of the value behind an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Float,
    Integer,
    Enum(&'static [EnumVariant]),
}

impl ValueType {
    pub fn kind(&self) -> &'static str {
        match self {
            ValueType::Float => "float",
            ValueType::Integer => "integer",
            ValueType::Enum(_) => "enum",
        }
    }

    /// Label for an enum raw value, if this is an enum type and the value is known.
    pub fn label(&self, raw: u16) -> Option<&'static str> {
        match self {
            ValueType::Enum(variants) => variants.iter().find(|v| v.raw == raw).map(|v| v.label),
            _ => None,
        }
    }
}

/// How a value is laid out in Modbus registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterEncoding {
    /// IEEE 754 single precision over two registers, low word first.
    Float,
    U16,
    I16,
}

impl RegisterEncoding {
    pub const fn register_count(&self) -> u16 {
        match self {
            RegisterEncoding::Float => 2,
            RegisterEncoding::U16 | RegisterEncoding::I16 => 1,
        }
    }
}

/// Static descriptor of one heat pump data point.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorAddress {
    pub name: String,
    /// 0-based zone module index; `None` for sensors of the main device.
    pub zone_id: Option<u8>,
    pub capabilities: Capabilities,
    pub value_type: ValueType,
    pub register: u16,
    pub encoding: RegisterEncoding,
    pub unit: Option<&'static str>,
    /// Accepted write range for integer addresses.
    pub range: Option<RangeInclusive<i64>>,
}

impl SensorAddress {
    /// Read-only float sensor (two registers).
    pub fn float(name: impl Into<String>, register: u16, unit: &'static str) -> Self {
        Self {
            name: name.into(),
            zone_id: None,
            capabilities: Capabilities::READ_ONLY,
            value_type: ValueType::Float,
            register,
            encoding: RegisterEncoding::Float,
            unit: Some(unit),
            range: None,
        }
    }

    /// Read-only unsigned integer sensor (one register).
    pub fn integer(name: impl Into<String>, register: u16, unit: Option<&'static str>) -> Self {
        Self {
            name: name.into(),
            zone_id: None,
            capabilities: Capabilities::READ_ONLY,
            value_type: ValueType::Integer,
            register,
            encoding: RegisterEncoding::U16,
            unit,
            range: None,
        }
    }

    /// Read-only enumerated sensor (one register).
    pub fn enumeration(
        name: impl Into<String>,
        register: u16,
        variants: &'static [EnumVariant],
    ) -> Self {
        Self {
            name: name.into(),
            zone_id: None,
            capabilities: Capabilities::READ_ONLY,
            value_type: ValueType::Enum(variants),
            register,
            encoding: RegisterEncoding::U16,
            unit: None,
            range: None,
        }
    }

    pub fn writable(mut self, capability: WriteCapability) -> Self {
        self.capabilities = Capabilities::read_write(capability);
        self
    }

    pub fn in_zone(mut self, zone_id: u8) -> Self {
        self.zone_id = Some(zone_id);
        self
    }

    pub fn with_range(mut self, range: RangeInclusive<i64>) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_encoding(mut self, encoding: RegisterEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn is_writable(&self) -> bool {
        self.capabilities.write.is_some()
    }

    pub fn supports(&self, capability: WriteCapability) -> bool {
        self.capabilities.supports(capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: &[EnumVariant] = &[
        EnumVariant {
            raw: 0,
            label: "standby",
        },
        EnumVariant {
            raw: 1,
            label: "automatic",
        },
    ];

    #[test]
    fn test_read_only_by_default() {
        let address = SensorAddress::float("temp_outside", 1000, "°C");
        assert!(address.capabilities.readable);
        assert!(!address.is_writable());
        assert_eq!(address.encoding.register_count(), 2);
        assert_eq!(address.zone_id, None);
    }

    #[test]
    fn test_single_write_capability() {
        let address = SensorAddress::integer("charge_state_battery", 86, Some("%"))
            .writable(WriteCapability::Battery);
        assert!(address.supports(WriteCapability::Battery));
        assert!(!address.supports(WriteCapability::Power));

        // Re-marking replaces the capability instead of adding a second one
        let address = address.writable(WriteCapability::Humidity);
        assert!(address.supports(WriteCapability::Humidity));
        assert!(!address.supports(WriteCapability::Battery));
    }

    #[test]
    fn test_enum_labels() {
        let address = SensorAddress::enumeration("system_mode", 1005, MODES);
        assert_eq!(address.value_type.label(1), Some("automatic"));
        assert_eq!(address.value_type.label(7), None);
        assert_eq!(ValueType::Float.label(0), None);
    }

    #[test]
    fn test_capability_names() {
        assert_eq!(WriteCapability::Temperature.to_string(), "temperature");
        let name: &'static str = WriteCapability::Power.into();
        assert_eq!(name, "power");
    }
}
