//! Input sources for the heat pump bridge.
//!
//! Each data source feeds sensor values into the update coordinator and
//! accepts writes from the command dispatcher.
//!
//! Current input sources:
//! - `modbus`: iDM Navigator over Modbus/TCP
//! - `simulation`: in-memory heat pump for development and tests
//!
//! `mqtt` is the outward surface: it publishes entity state and receives
//! service calls.

pub mod modbus;
pub mod mqtt;
pub mod simulation;
pub mod source;

pub use modbus::IdmModbusSource;
pub use simulation::SimulatedHeatpump;
pub use source::{DataSource, SensorValues};
