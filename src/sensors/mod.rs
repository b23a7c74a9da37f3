//! Sensor addresses and values.
//!
//! The registry maps sensor names to static descriptors of the heat pump's
//! data points; values are produced by a data source and cached by the
//! update coordinator.

pub mod address;
pub mod registry;
pub mod table;
pub mod value;

pub use address::{
    Capabilities, EnumVariant, RegisterEncoding, SensorAddress, ValueType, WriteCapability,
};
pub use registry::SensorRegistry;
pub use value::{Reading, SensorValue};
