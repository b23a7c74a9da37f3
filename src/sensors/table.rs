//! Fixed sensor table for the iDM Navigator 2.0 controller.
//!
//! Register numbers follow the Navigator Modbus/TCP map. Zone modules start
//! at register 2000 and each occupies a block of 65 registers.

use super::address::{EnumVariant, RegisterEncoding, SensorAddress, WriteCapability};

/// Maximum number of zone modules a Navigator can address.
pub const MAX_ZONES: u8 = 10;

const ZONE_BASE_REGISTER: u16 = 2000;
const ZONE_REGISTER_STRIDE: u16 = 65;

const SYSTEM_MODES: &[EnumVariant] = &[
    EnumVariant {
        raw: 0,
        label: "standby",
    },
    EnumVariant {
        raw: 1,
        label: "automatic",
    },
    EnumVariant {
        raw: 2,
        label: "away",
    },
    EnumVariant {
        raw: 4,
        label: "hot_water_only",
    },
    EnumVariant {
        raw: 5,
        label: "heating_cooling_only",
    },
];

const SMART_GRID_STATES: &[EnumVariant] = &[
    EnumVariant {
        raw: 0,
        label: "grid_blocked_solar_off",
    },
    EnumVariant {
        raw: 1,
        label: "grid_allowed_solar_off",
    },
    EnumVariant {
        raw: 2,
        label: "grid_unused_solar_on",
    },
    EnumVariant {
        raw: 4,
        label: "grid_blocked_solar_on",
    },
];

const HEATPUMP_OPERATING_MODES: &[EnumVariant] = &[
    EnumVariant {
        raw: 0,
        label: "off",
    },
    EnumVariant {
        raw: 1,
        label: "heating",
    },
    EnumVariant {
        raw: 2,
        label: "cooling",
    },
    EnumVariant {
        raw: 4,
        label: "water",
    },
    EnumVariant {
        raw: 8,
        label: "defrosting",
    },
];

const ZONE_MODES: &[EnumVariant] = &[
    EnumVariant {
        raw: 0,
        label: "cooling",
    },
    EnumVariant {
        raw: 1,
        label: "heating",
    },
];

/// Sensors of the main device.
pub fn main_device_sensors() -> Vec<SensorAddress> {
    vec![
        SensorAddress::float("power_solar_surplus", 74, "kW").writable(WriteCapability::Power),
        SensorAddress::float("power_solar_production", 78, "kW").writable(WriteCapability::Power),
        SensorAddress::float("power_use_house", 82, "W").writable(WriteCapability::Power),
        SensorAddress::float("power_drain_battery", 84, "W").writable(WriteCapability::Power),
        SensorAddress::integer("charge_state_battery", 86, Some("%"))
            .writable(WriteCapability::Battery)
            .with_range(0..=100),
        SensorAddress::float("temp_outside", 1000, "°C"),
        SensorAddress::float("temp_outside_avg", 1002, "°C"),
        SensorAddress::integer("failure_id", 1004, None),
        SensorAddress::enumeration("system_mode", 1005, SYSTEM_MODES),
        SensorAddress::enumeration("smart_grid_status", 1006, SMART_GRID_STATES),
        SensorAddress::float("temp_heat_storage", 1008, "°C"),
        SensorAddress::float("temp_cold_storage", 1010, "°C"),
        SensorAddress::float("temp_water_heater_top", 1012, "°C"),
        SensorAddress::float("temp_water_heater_bottom", 1014, "°C"),
        SensorAddress::float("temp_water_heater_tap", 1030, "°C"),
        SensorAddress::integer("target_temp_water_heater", 1032, Some("°C"))
            .writable(WriteCapability::Temperature)
            .with_range(35..=95),
        SensorAddress::float("temp_flow_current_heatpump", 1050, "°C"),
        SensorAddress::float("temp_return_heatpump", 1052, "°C"),
        SensorAddress::enumeration("heatpump_operating_mode", 1090, HEATPUMP_OPERATING_MODES),
        SensorAddress::integer("humidity", 1392, Some("%"))
            .writable(WriteCapability::Humidity)
            .with_range(0..=100),
        SensorAddress::integer("target_temp_external_heating", 1694, Some("°C"))
            .writable(WriteCapability::Temperature)
            .with_range(0..=90),
        SensorAddress::integer("target_temp_external_cooling", 1695, Some("°C"))
            .writable(WriteCapability::Temperature)
            .with_range(0..=30),
        SensorAddress::float("power_current_draw", 4122, "kW"),
    ]
}

/// Sensors of one zone module. Names use the 1-based zone number shown to users.
pub fn zone_sensors(zone_id: u8) -> Vec<SensorAddress> {
    let base = ZONE_BASE_REGISTER + u16::from(zone_id) * ZONE_REGISTER_STRIDE;
    let number = u16::from(zone_id) + 1;

    vec![
        SensorAddress::enumeration(format!("zone_{number}_mode"), base, ZONE_MODES),
        SensorAddress::float(format!("zone_{number}_room_1_temp"), base + 4, "°C"),
        SensorAddress::float(format!("zone_{number}_room_1_target_heating"), base + 6, "°C"),
        SensorAddress::float(format!("zone_{number}_room_1_target_cooling"), base + 8, "°C"),
        SensorAddress::integer(format!("zone_{number}_room_1_humidity"), base + 10, Some("%"))
            .writable(WriteCapability::Humidity)
            .with_range(0..=100),
        SensorAddress::integer(format!("zone_{number}_room_1_mode"), base + 21, None)
            .with_encoding(RegisterEncoding::I16),
    ]
    .into_iter()
    .map(|address| address.in_zone(zone_id))
    .collect()
}

/// The full table: main device first, then each zone module in order.
pub fn heatpump_sensors(zone_count: u8) -> Vec<SensorAddress> {
    let mut sensors = main_device_sensors();
    for zone_id in 0..zone_count.min(MAX_ZONES) {
        sensors.extend(zone_sensors(zone_id));
    }
    sensors
}
