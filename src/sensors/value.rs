//! Sensor values and entity readings.

use super::address::ValueType;
use serde::Serialize;
use std::fmt;

/// A decoded sensor value.
///
/// Serializes as a plain JSON number. There is no `Deserialize`: a bare
/// number cannot tell integers from floats or enums, so incoming values are
/// typed against their address instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Float(f32),
    Integer(i64),
    /// Raw value of an enumerated register.
    Enum(u16),
}

impl SensorValue {
    /// Human-facing representation, resolving enum labels through `value_type`.
    pub fn display(&self, value_type: &ValueType) -> String {
        match self {
            SensorValue::Float(v) => format!("{v}"),
            SensorValue::Integer(v) => v.to_string(),
            SensorValue::Enum(raw) => value_type
                .label(*raw)
                .map(str::to_string)
                .unwrap_or_else(|| raw.to_string()),
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Float(v) => write!(f, "{v}"),
            SensorValue::Integer(v) => write!(f, "{v}"),
            SensorValue::Enum(v) => write!(f, "{v}"),
        }
    }
}

/// What an entity reports for its sensor.
///
/// `Null` means the data source reports the sensor without a value;
/// `Unavailable` means the sensor is missing from the latest snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(SensorValue),
    Null,
    Unavailable,
}

impl Reading {
    pub fn value(&self) -> Option<SensorValue> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Null | Reading::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Reading::Unavailable)
    }
}

impl From<Option<SensorValue>> for Reading {
    fn from(value: Option<SensorValue>) -> Self {
        match value {
            Some(v) => Reading::Value(v),
            None => Reading::Null,
        }
    }
}
