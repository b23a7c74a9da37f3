//! In-memory heat pump used for development and tests.

use crate::error::{BridgeError, Result};
use crate::input::source::{DataSource, SensorValues};
use crate::sensors::{SensorRegistry, SensorValue, ValueType};
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::RwLock;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

/// Simulated heat pump.
///
/// Holds one value per sensor, records every write, and can be taken offline
/// or made to stop reporting individual sensors.
pub struct SimulatedHeatpump {
    values: RwLock<SensorValues>,
    writes: RwLock<Vec<(String, SensorValue)>>,
    offline: AtomicBool,
}

impl SimulatedHeatpump {
    /// Create a simulator reporting a plausible value for every readable sensor.
    pub fn new(registry: &SensorRegistry) -> Self {
        let values = registry
            .readable()
            .map(|address| {
                let value = match address.value_type {
                    ValueType::Float => SensorValue::Float(if address.unit == Some("°C") {
                        21.0
                    } else {
                        0.0
                    }),
                    ValueType::Integer => SensorValue::Integer(
                        address.range.as_ref().map(|r| *r.start()).unwrap_or(0),
                    ),
                    ValueType::Enum(variants) => {
                        SensorValue::Enum(variants.first().map(|v| v.raw).unwrap_or(0))
                    }
                };
                (address.name.clone(), Some(value))
            })
            .collect();
        Self::with_values(values)
    }

    /// Create a simulator reporting exactly `values`.
    pub fn with_values(values: SensorValues) -> Self {
        Self {
            values: RwLock::new(values),
            writes: RwLock::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Make subsequent fetches and writes fail.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_value(&self, name: &str, value: Option<SensorValue>) {
        self.values.write().insert(name.to_string(), value);
    }

    /// Stop reporting a sensor, as after a device reconfiguration.
    pub fn remove_sensor(&self, name: &str) {
        self.values.write().remove(name);
    }

    /// All writes received so far, in order.
    pub fn writes(&self) -> Vec<(String, SensorValue)> {
        self.writes.read().clone()
    }

    /// Nudge every float reading by a small random amount.
    pub fn drift(&self) {
        let mut rng = rand::thread_rng();
        for value in self.values.write().values_mut() {
            if let Some(SensorValue::Float(v)) = value {
                *v += rng.gen_range(-0.2f32..=0.2);
            }
        }
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BridgeError::DataSource(
                "simulated heat pump is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DataSource for SimulatedHeatpump {
    async fn fetch_all(&self) -> Result<SensorValues> {
        self.check_online()?;
        Ok(self.values.read().clone())
    }

    async fn write(&self, name: &str, value: SensorValue) -> Result<()> {
        self.check_online()?;
        debug!("[Sim] write {} = {}", name, value);
        self.writes.write().push((name.to_string(), value));
        self.values.write().insert(name.to_string(), Some(value));
        Ok(())
    }
}

/// Spawn a task that periodically drifts the simulated readings.
///
/// # Returns
///
/// A `JoinHandle` that can be used to abort the simulation task.
pub fn run_simulation(heatpump: Arc<SimulatedHeatpump>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval(period);
        loop {
            interval.tick().await;
            heatpump.drift();
            info!("[Sim] Heat pump readings drifted");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{SensorAddress, WriteCapability};

    fn registry() -> SensorRegistry {
        SensorRegistry::new(vec![
            SensorAddress::float("outdoor_temp", 1000, "°C"),
            SensorAddress::integer("dhw_setpoint", 1032, Some("°C"))
                .writable(WriteCapability::Temperature)
                .with_range(35..=95),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_seeds_every_readable_sensor() {
        let sim = SimulatedHeatpump::new(&registry());
        let values = sim.fetch_all().await.unwrap();
        assert_eq!(values.get("outdoor_temp"), Some(&Some(SensorValue::Float(21.0))));
        assert_eq!(values.get("dhw_setpoint"), Some(&Some(SensorValue::Integer(35))));
    }

    #[tokio::test]
    async fn test_records_writes() {
        let sim = SimulatedHeatpump::new(&registry());
        sim.write("dhw_setpoint", SensorValue::Integer(50)).await.unwrap();
        assert_eq!(
            sim.writes(),
            vec![("dhw_setpoint".to_string(), SensorValue::Integer(50))]
        );
        let values = sim.fetch_all().await.unwrap();
        assert_eq!(values["dhw_setpoint"], Some(SensorValue::Integer(50)));
    }

    #[tokio::test]
    async fn test_offline_fails_fetch_and_write() {
        let sim = SimulatedHeatpump::new(&registry());
        sim.set_offline(true);
        assert!(sim.fetch_all().await.is_err());
        assert!(sim.write("dhw_setpoint", SensorValue::Integer(40)).await.is_err());
        assert!(sim.writes().is_empty());

        sim.set_offline(false);
        assert!(sim.fetch_all().await.is_ok());
    }

    #[tokio::test]
    async fn test_removed_sensor_is_not_reported() {
        let sim = SimulatedHeatpump::new(&registry());
        sim.remove_sensor("outdoor_temp");
        let values = sim.fetch_all().await.unwrap();
        assert!(!values.contains_key("outdoor_temp"));
    }

    #[test]
    fn test_drift_only_touches_floats() {
        let sim = SimulatedHeatpump::new(&registry());
        sim.drift();
        let values = sim.values.read();
        match values["outdoor_temp"] {
            Some(SensorValue::Float(v)) => assert!((v - 21.0).abs() < 0.21),
            other => panic!("unexpected value {:?}", other),
        }
        assert_eq!(values["dhw_setpoint"], Some(SensorValue::Integer(35)));
    }
}
