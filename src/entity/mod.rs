//! Entities exposed by the bridge.
//!
//! Each entity wraps one sensor address and reads its value from the update
//! coordinator.

pub mod facade;
pub mod traits;

pub use facade::{EntityFacade, build_entities, unique_id};
pub use traits::{Availability, Entity};
