//! Simulated heat pump for development and testing.

mod heatpump;

pub use heatpump::{SimulatedHeatpump, run_simulation};
