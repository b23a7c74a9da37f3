//! Device grouping for heat pump entities.

pub mod device_info;

pub use device_info::{
    DOMAIN, DeviceIdentifier, DeviceInfo, EntryContext, main_device_identifier, slugify,
    zone_device_identifier,
};
