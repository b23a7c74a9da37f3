//! DataSource trait connecting the bridge to the heat pump.

use crate::error::Result;
use crate::sensors::SensorValue;
use async_trait::async_trait;
use std::collections::HashMap;

/// Values reported by one fetch, keyed by sensor name.
///
/// A name mapped to `None` is reported without a value. Names missing from the
/// map are not reported at all.
pub type SensorValues = HashMap<String, Option<SensorValue>>;

/// Trait for the external collaborator that talks to the heat pump.
///
/// Implementations own transport concerns: timeouts, reconnects and retries
/// belong here, not in the coordinator or dispatcher.
///
/// # Example
/// ```ignore
/// struct FixedSource;
///
/// #[async_trait]
/// impl DataSource for FixedSource {
///     async fn fetch_all(&self) -> Result<SensorValues> {
///         Ok(SensorValues::from([("temp_outside".into(), Some(SensorValue::Float(5.3)))]))
///     }
///
///     async fn write(&self, _name: &str, _value: SensorValue) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    /// Fetch the current value of every sensor the device reports.
    async fn fetch_all(&self) -> Result<SensorValues>;

    /// Write a value to the named sensor.
    async fn write(&self, name: &str, value: SensorValue) -> Result<()>;
}
