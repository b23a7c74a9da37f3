//! Shared contract for heat pump entities.
//!
//! Every exposed entity identifies itself with a stable unique id, reports its
//! availability, and names the device it belongs to.

use crate::device::DeviceInfo;
use strum::{Display, IntoStaticStr};

/// Availability of an entity, derived from the latest snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum Availability {
    /// Reported in the latest snapshot and the last refresh succeeded.
    #[strum(serialize = "online")]
    Available,
    /// Reported in the latest snapshot, but the most recent refresh failed.
    #[strum(serialize = "stale")]
    Stale,
    /// Not reported in the latest snapshot.
    #[strum(serialize = "offline")]
    Unavailable,
}

/// Trait implemented by every kind of entity the bridge exposes.
///
/// # Example
/// ```ignore
/// fn describe(entity: &dyn Entity) -> String {
///     format!(
///         "{} on {} ({})",
///         entity.identify(),
///         entity.device_context().name,
///         entity.availability()
///     )
/// }
/// ```
pub trait Entity: Send + Sync {
    /// Unique id, stable across restarts.
    fn identify(&self) -> &str;

    fn availability(&self) -> Availability;

    /// Device this entity is grouped under.
    fn device_context(&self) -> DeviceInfo;
}
