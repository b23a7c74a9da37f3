//! IDM heat pump bridge library.
//!
//! Reads an iDM Navigator heat pump over Modbus/TCP, keeps a consistent
//! snapshot of its sensor values, exposes every sensor as an entity and
//! offers risk-gated write services for power, battery, temperature and
//! humidity setpoints.

pub mod bridge;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod device;
pub mod entity;
pub mod error;
pub mod input;
pub mod instance_lock;
pub mod sensors;
