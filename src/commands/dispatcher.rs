//! Command dispatcher for the risk-gated write services.
//!
//! All four services run the same procedure, parameterized by their
//! [`OperationDescriptor`]:
//! 1. resolve the target entity
//! 2. check the entity supports the service's write capability
//! 3. require an explicit `acknowledge_risk: true`
//! 4. extract a value of the expected type, then write it
//!
//! A failing step stops the procedure; nothing is written.

use super::operation::{OperationDescriptor, ValueKind, WriteOperation};
use super::request::CommandRequest;
use crate::entity::{Entity, EntityFacade};
use crate::error::{BridgeError, Result};
use crate::sensors::SensorValue;
use log::{info, warn};
use serde_json::Value;
use std::collections::HashMap;

pub struct CommandDispatcher {
    entities: Vec<EntityFacade>,
    /// Sensor names and unique ids, both mapped to the entity position.
    index: HashMap<String, usize>,
}

impl CommandDispatcher {
    pub fn new(entities: Vec<EntityFacade>) -> Self {
        let mut index = HashMap::with_capacity(entities.len() * 2);
        for (position, entity) in entities.iter().enumerate() {
            index.insert(entity.name().to_string(), position);
            index.insert(entity.identify().to_string(), position);
        }
        Self { entities, index }
    }

    pub fn entities(&self) -> &[EntityFacade] {
        &self.entities
    }

    /// Look up an entity by sensor name or unique id.
    pub fn entity(&self, target: &str) -> Option<&EntityFacade> {
        self.index.get(target).map(|&position| &self.entities[position])
    }

    /// Run a write service.
    pub async fn dispatch(
        &self,
        operation: WriteOperation,
        request: &CommandRequest,
    ) -> Result<()> {
        let result = self.run(operation.descriptor(), request).await;
        if let Err(e) = &result {
            warn!(
                "[Command] {} on {:?} rejected ({}): {}",
                operation,
                request.target,
                e.translation_key(),
                e
            );
        }
        result
    }

    /// Parse a service name and JSON payload, then dispatch.
    pub async fn dispatch_json(&self, service: &str, payload: &str) -> Result<()> {
        let operation = WriteOperation::from_service(service)?;
        let request = CommandRequest::from_json(payload)?;
        self.dispatch(operation, &request).await
    }

    async fn run(&self, descriptor: &OperationDescriptor, request: &CommandRequest) -> Result<()> {
        let target = request.target.as_deref().unwrap_or_default();
        let entity = self
            .entity(target)
            .ok_or_else(|| BridgeError::TargetNotFound(target.to_string()))?;

        if !entity.supports(descriptor.capability) {
            return Err(BridgeError::UnsupportedOperation {
                target: entity.identify().to_string(),
                operation: descriptor.service.to_string(),
            });
        }

        if !request.is_acknowledged() {
            return Err(BridgeError::RiskNotAcknowledged {
                operation: descriptor.service.to_string(),
                message_key: descriptor.risk_message_key,
            });
        }

        let value = extract_value(descriptor, entity, request.value.as_ref())?;

        info!(
            "[Command] Calling {} with value {} on {}",
            descriptor.service,
            value,
            entity.identify()
        );
        entity.write(value).await
    }
}

/// Extract the typed value without coercion and check the address range.
fn extract_value(
    descriptor: &OperationDescriptor,
    entity: &EntityFacade,
    raw: Option<&Value>,
) -> Result<SensorValue> {
    let invalid = |value: String, reason: &str| BridgeError::InvalidValue {
        target: entity.identify().to_string(),
        value,
        reason: reason.to_string(),
    };

    let Some(raw) = raw else {
        return Err(invalid("null".to_string(), "missing value"));
    };

    match descriptor.value_kind {
        ValueKind::Float => {
            let number = raw
                .as_f64()
                .filter(|v| v.is_finite() && v.abs() <= f64::from(f32::MAX))
                .ok_or_else(|| invalid(raw.to_string(), "expected a finite number"))?;
            Ok(SensorValue::Float(number as f32))
        }
        ValueKind::Integer => {
            let number = raw
                .as_i64()
                .ok_or_else(|| invalid(raw.to_string(), "expected an integer"))?;
            if let Some(range) = &entity.address().range
                && !range.contains(&number)
            {
                return Err(invalid(
                    number.to_string(),
                    &format!("outside {}..={}", range.start(), range.end()),
                ));
            }
            Ok(SensorValue::Integer(number))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::UpdateCoordinator;
    use crate::device::EntryContext;
    use crate::entity::build_entities;
    use crate::input::SensorValues;
    use crate::input::simulation::SimulatedHeatpump;
    use crate::sensors::{Reading, SensorAddress, SensorRegistry, WriteCapability};
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        sim: Arc<SimulatedHeatpump>,
        coordinator: Arc<UpdateCoordinator>,
        dispatcher: CommandDispatcher,
    }

    /// Registry with `outdoor_temp` (read only), `dhw_setpoint` (temperature,
    /// integer) and one target per remaining service; the snapshot only
    /// reports `outdoor_temp`.
    async fn fixture() -> Fixture {
        let registry = SensorRegistry::new(vec![
            SensorAddress::float("outdoor_temp", 1000, "°C"),
            SensorAddress::integer("dhw_setpoint", 1032, Some("°C"))
                .writable(WriteCapability::Temperature)
                .with_range(10..=95),
            SensorAddress::float("pv_surplus", 74, "kW").writable(WriteCapability::Power),
            SensorAddress::integer("battery_soc", 86, Some("%"))
                .writable(WriteCapability::Battery)
                .with_range(0..=100),
            SensorAddress::integer("zone_1_room_1_humidity", 2010, Some("%"))
                .writable(WriteCapability::Humidity)
                .with_range(0..=100)
                .in_zone(0),
        ])
        .unwrap();
        let sim = Arc::new(SimulatedHeatpump::with_values(SensorValues::from([(
            "outdoor_temp".to_string(),
            Some(SensorValue::Float(5.3)),
        )])));
        let coordinator = Arc::new(UpdateCoordinator::new(sim.clone()));
        coordinator.refresh().await.unwrap();
        let context = Arc::new(EntryContext::new("entry1", "idm.local", "Heat Pump"));
        let dispatcher = CommandDispatcher::new(build_entities(&registry, &coordinator, &context));
        Fixture {
            sim,
            coordinator,
            dispatcher,
        }
    }

    #[tokio::test]
    async fn test_scenario_write_to_unavailable_setpoint() {
        let f = fixture().await;
        let outdoor = f.dispatcher.entity("outdoor_temp").unwrap();
        let setpoint = f.dispatcher.entity("dhw_setpoint").unwrap();
        assert_eq!(outdoor.value(), Reading::Value(SensorValue::Float(5.3)));
        assert_eq!(setpoint.value(), Reading::Unavailable);

        f.dispatcher
            .dispatch(
                WriteOperation::SetTemperature,
                &CommandRequest::new("dhw_setpoint", true, 55),
            )
            .await
            .unwrap();

        assert_eq!(
            f.sim.writes(),
            vec![("dhw_setpoint".to_string(), SensorValue::Integer(55))]
        );
        // Snapshot is only updated by the next refresh
        assert_eq!(setpoint.value(), Reading::Unavailable);
        assert_eq!(f.coordinator.current().version(), 1);
    }

    #[tokio::test]
    async fn test_missing_capability_is_unsupported_even_when_acknowledged() {
        let f = fixture().await;
        let err = f
            .dispatcher
            .dispatch(
                WriteOperation::SetPower,
                &CommandRequest::new("dhw_setpoint", true, 1.5),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::UnsupportedOperation { ref operation, .. } if operation == "set_power"
        ));

        let err = f
            .dispatcher
            .dispatch(
                WriteOperation::SetTemperature,
                &CommandRequest::new("outdoor_temp", true, 20),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedOperation { .. }));
        assert!(f.sim.writes().is_empty());
    }

    #[tokio::test]
    async fn test_unacknowledged_never_writes() {
        let f = fixture().await;
        for acknowledge in [None, Some(json!(false)), Some(json!("yes")), Some(json!(1))] {
            let request = CommandRequest {
                target: Some("dhw_setpoint".to_string()),
                acknowledge_risk: acknowledge,
                value: Some(json!(55)),
            };
            let err = f
                .dispatcher
                .dispatch(WriteOperation::SetTemperature, &request)
                .await
                .unwrap_err();
            assert_eq!(err.message_key(), Some("set_temperature_risk_not_acknowledged"));
        }
        assert!(f.sim.writes().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_target_is_checked_first() {
        let f = fixture().await;
        for request in [
            CommandRequest::new("indoor_temp", false, "not a number"),
            CommandRequest::new("indoor_temp", true, 55),
            CommandRequest::default(),
        ] {
            for operation in WriteOperation::ALL {
                let err = f.dispatcher.dispatch(operation, &request).await.unwrap_err();
                assert!(matches!(err, BridgeError::TargetNotFound(_)), "{:?}", err);
            }
        }
        assert!(f.sim.writes().is_empty());
    }

    #[tokio::test]
    async fn test_target_by_unique_id() {
        let f = fixture().await;
        f.dispatcher
            .dispatch(
                WriteOperation::SetPower,
                &CommandRequest::new("idm_local_pv_surplus", true, 2.5),
            )
            .await
            .unwrap();
        assert_eq!(
            f.sim.writes(),
            vec![("pv_surplus".to_string(), SensorValue::Float(2.5))]
        );
    }

    #[tokio::test]
    async fn test_no_implicit_coercion() {
        let f = fixture().await;
        for value in [json!(55.0), json!("55"), json!(true), json!(null)] {
            let request = CommandRequest {
                target: Some("dhw_setpoint".to_string()),
                acknowledge_risk: Some(json!(true)),
                value: Some(value).filter(|v| !v.is_null()),
            };
            let err = f
                .dispatcher
                .dispatch(WriteOperation::SetTemperature, &request)
                .await
                .unwrap_err();
            assert!(matches!(err, BridgeError::InvalidValue { .. }), "{:?}", err);
        }

        let err = f
            .dispatcher
            .dispatch(
                WriteOperation::SetPower,
                &CommandRequest::new("pv_surplus", true, "2.5"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidValue { .. }));
        assert!(f.sim.writes().is_empty());
    }

    #[tokio::test]
    async fn test_battery_and_humidity_writes() {
        let f = fixture().await;
        tokio_test::assert_ok!(
            f.dispatcher
                .dispatch(
                    WriteOperation::SetBattery,
                    &CommandRequest::new("battery_soc", true, 80),
                )
                .await
        );
        let payload = json!({
            "target": "zone_1_room_1_humidity",
            "acknowledge_risk": true,
            "value": 45
        })
        .to_string();
        tokio_test::assert_ok!(f.dispatcher.dispatch_json("set_humidity", &payload).await);
        assert_eq!(
            f.sim.writes(),
            vec![
                ("battery_soc".to_string(), SensorValue::Integer(80)),
                ("zone_1_room_1_humidity".to_string(), SensorValue::Integer(45)),
            ]
        );

        // Each target only accepts its own service
        let err = tokio_test::assert_err!(
            f.dispatcher
                .dispatch(
                    WriteOperation::SetHumidity,
                    &CommandRequest::new("battery_soc", true, 45),
                )
                .await
        );
        assert!(matches!(err, BridgeError::UnsupportedOperation { .. }));
        let err = tokio_test::assert_err!(
            f.dispatcher
                .dispatch(
                    WriteOperation::SetBattery,
                    &CommandRequest::new("battery_soc", true, 101),
                )
                .await
        );
        assert!(matches!(err, BridgeError::InvalidValue { .. }));
        assert_eq!(f.sim.writes().len(), 2);
    }

    #[tokio::test]
    async fn test_power_accepts_integral_json_numbers() {
        let f = fixture().await;
        f.dispatcher
            .dispatch(WriteOperation::SetPower, &CommandRequest::new("pv_surplus", true, 3))
            .await
            .unwrap();
        assert_eq!(
            f.sim.writes(),
            vec![("pv_surplus".to_string(), SensorValue::Float(3.0))]
        );
    }

    #[tokio::test]
    async fn test_range_is_enforced() {
        let f = fixture().await;
        let err = f
            .dispatcher
            .dispatch(
                WriteOperation::SetTemperature,
                &CommandRequest::new("dhw_setpoint", true, 120),
            )
            .await
            .unwrap_err();
        match err {
            BridgeError::InvalidValue { value, reason, .. } => {
                assert_eq!(value, "120");
                assert_eq!(reason, "outside 10..=95");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(f.sim.writes().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_json() {
        let f = fixture().await;
        f.dispatcher
            .dispatch_json(
                "set_temperature",
                r#"{"target": "dhw_setpoint", "acknowledge_risk": true, "value": 48}"#,
            )
            .await
            .unwrap();
        assert_eq!(f.sim.writes().len(), 1);

        assert!(matches!(
            f.dispatcher.dispatch_json("set_mode", "{}").await,
            Err(BridgeError::UnknownService(_))
        ));
        assert!(matches!(
            f.dispatcher
                .dispatch_json("set_temperature", r#"{"target": "dhw_setpoint", "extra": 1}"#)
                .await,
            Err(BridgeError::InvalidPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_data_source_failure_is_surfaced() {
        let f = fixture().await;
        f.sim.set_offline(true);
        let err = f
            .dispatcher
            .dispatch(
                WriteOperation::SetTemperature,
                &CommandRequest::new("dhw_setpoint", true, 50),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::DataSource(_)));
    }
}
