//! Modbus/TCP input source for the iDM Navigator heat pump controller.

mod client;
pub mod codec;

pub use client::{IdmModbusSource, RegisterKind};
