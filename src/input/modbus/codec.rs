//! Register codec for the iDM Navigator.
//!
//! Floats span two registers with the low word first. Integers and enums
//! occupy one register.

use crate::error::{BridgeError, Result};
use crate::sensors::{RegisterEncoding, SensorAddress, SensorValue, ValueType};

pub fn idm_float_to_u16(value: f32) -> [u16; 2] {
    let value: [u8; 4] = value.to_be_bytes();
    [
        value[3] as u16 + ((value[2] as u16) << 8),
        value[1] as u16 + ((value[0] as u16) << 8),
    ]
}

pub fn u16_to_idm_float(registers: [u16; 2]) -> f32 {
    f32::from_bits((u32::from(registers[1]) << 16) | u32::from(registers[0]))
}

/// Decode the registers read for `address`.
///
/// A NaN float means the controller has no value for this sensor.
pub fn decode(address: &SensorAddress, registers: &[u16]) -> Result<Option<SensorValue>> {
    let expected = address.encoding.register_count() as usize;
    if registers.len() < expected {
        return Err(BridgeError::DataSource(format!(
            "{}: expected {} registers, got {}",
            address.name,
            expected,
            registers.len()
        )));
    }

    let value = match address.encoding {
        RegisterEncoding::Float => {
            let value = u16_to_idm_float([registers[0], registers[1]]);
            if value.is_nan() {
                return Ok(None);
            }
            SensorValue::Float(value)
        }
        RegisterEncoding::U16 => match address.value_type {
            ValueType::Enum(_) => SensorValue::Enum(registers[0]),
            _ => SensorValue::Integer(i64::from(registers[0])),
        },
        RegisterEncoding::I16 => SensorValue::Integer(i64::from(registers[0] as i16)),
    };
    Ok(Some(value))
}

/// Encode `value` for writing to `address`. No conversion between floats and integers.
pub fn encode(address: &SensorAddress, value: SensorValue) -> Result<Vec<u16>> {
    let invalid = |reason: &str| BridgeError::InvalidValue {
        target: address.name.clone(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    match (address.encoding, value) {
        (RegisterEncoding::Float, SensorValue::Float(v)) => Ok(idm_float_to_u16(v).to_vec()),
        (RegisterEncoding::U16, SensorValue::Integer(v)) => u16::try_from(v)
            .map(|raw| vec![raw])
            .map_err(|_| invalid("out of range for an unsigned register")),
        (RegisterEncoding::U16, SensorValue::Enum(raw)) => Ok(vec![raw]),
        (RegisterEncoding::I16, SensorValue::Integer(v)) => i16::try_from(v)
            .map(|raw| vec![raw as u16])
            .map_err(|_| invalid("out of range for a signed register")),
        _ => Err(invalid("value type does not match the register")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::WriteCapability;

    #[test]
    fn test_float_low_word_first() {
        // 1.0 = 0x3F80_0000
        assert_eq!(idm_float_to_u16(1.0), [0x0000, 0x3F80]);
        assert_eq!(u16_to_idm_float([0x0000, 0x3F80]), 1.0);
        // 5.3 = 0x40A9_999A
        assert_eq!(idm_float_to_u16(5.3), [0x999A, 0x40A9]);
    }

    #[test]
    fn test_decode_nan_as_null() {
        let address = SensorAddress::float("temp_outside", 1000, "°C");
        let nan = idm_float_to_u16(f32::NAN);
        assert_eq!(decode(&address, &nan).unwrap(), None);
        assert_eq!(
            decode(&address, &[0x999A, 0x40A9]).unwrap(),
            Some(SensorValue::Float(5.3))
        );
    }

    #[test]
    fn test_decode_short_read() {
        let address = SensorAddress::float("temp_outside", 1000, "°C");
        assert!(matches!(
            decode(&address, &[0x0000]),
            Err(BridgeError::DataSource(_))
        ));
    }

    #[test]
    fn test_decode_integers_and_enums() {
        let counter = SensorAddress::integer("failure_id", 1004, None);
        assert_eq!(decode(&counter, &[42]).unwrap(), Some(SensorValue::Integer(42)));

        let signed = SensorAddress::integer("room_mode", 2021, None)
            .with_encoding(RegisterEncoding::I16);
        assert_eq!(decode(&signed, &[0xFFFB]).unwrap(), Some(SensorValue::Integer(-5)));

        let mode = SensorAddress::enumeration("system_mode", 1005, &[]);
        assert_eq!(decode(&mode, &[4]).unwrap(), Some(SensorValue::Enum(4)));
    }

    #[test]
    fn test_encode_rejects_mismatched_types() {
        let power = SensorAddress::float("power_solar_surplus", 74, "kW")
            .writable(WriteCapability::Power);
        assert!(encode(&power, SensorValue::Integer(3)).is_err());
        assert_eq!(
            encode(&power, SensorValue::Float(1.0)).unwrap(),
            vec![0x0000, 0x3F80]
        );

        let setpoint = SensorAddress::integer("target_temp_water_heater", 1032, Some("°C"))
            .writable(WriteCapability::Temperature);
        assert!(matches!(
            encode(&setpoint, SensorValue::Float(55.0)),
            Err(BridgeError::InvalidValue { .. })
        ));
        assert!(encode(&setpoint, SensorValue::Integer(-1)).is_err());
        assert_eq!(encode(&setpoint, SensorValue::Integer(55)).unwrap(), vec![55]);
    }
}
