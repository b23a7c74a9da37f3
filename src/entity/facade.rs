//! Entity facade binding one sensor address to the coordinator.

use super::traits::{Availability, Entity};
use crate::coordinator::UpdateCoordinator;
use crate::device::{DOMAIN, DeviceInfo, EntryContext, slugify};
use crate::error::{BridgeError, Result};
use crate::sensors::{
    Reading, SensorAddress, SensorRegistry, SensorValue, ValueType, WriteCapability,
};
use log::debug;
use std::sync::Arc;

/// Unique id of the entity for `sensor_name` on the heat pump at `hostname`.
pub fn unique_id(hostname: &str, sensor_name: &str) -> String {
    format!("{}_{}", slugify(hostname), sensor_name)
}

/// A sensor address exposed as a named, readable and optionally writable value.
///
/// Reads come from the coordinator's current snapshot. Writes go straight to
/// the data source and show up in the snapshot after the next refresh.
pub struct EntityFacade {
    address: SensorAddress,
    coordinator: Arc<UpdateCoordinator>,
    context: Arc<EntryContext>,
    unique_id: String,
}

impl EntityFacade {
    pub fn new(
        address: SensorAddress,
        coordinator: Arc<UpdateCoordinator>,
        context: Arc<EntryContext>,
    ) -> Self {
        let unique_id = unique_id(&context.hostname, &address.name);
        Self {
            address,
            coordinator,
            context,
            unique_id,
        }
    }

    pub fn address(&self) -> &SensorAddress {
        &self.address
    }

    pub fn name(&self) -> &str {
        &self.address.name
    }

    pub fn supports(&self, capability: WriteCapability) -> bool {
        self.address.supports(capability)
    }

    /// Current reading from the latest snapshot.
    pub fn value(&self) -> Reading {
        self.coordinator.current().reading(&self.address.name)
    }

    /// Reading formatted for display, with enum labels resolved.
    pub fn display_value(&self) -> Option<String> {
        self.value()
            .value()
            .map(|value| value.display(&self.address.value_type))
    }

    pub fn extra_attributes(&self) -> serde_json::Value {
        serde_json::json!({ "integration": DOMAIN })
    }

    /// Forward a write to the data source.
    ///
    /// Fails without side effects when the address is not writable or the value
    /// type does not match. The cached snapshot is left untouched.
    pub async fn write(&self, value: SensorValue) -> Result<()> {
        let Some(capability) = self.address.capabilities.write else {
            return Err(BridgeError::UnsupportedOperation {
                target: self.unique_id.clone(),
                operation: "write".to_string(),
            });
        };

        let type_matches = matches!(
            (self.address.value_type, value),
            (ValueType::Float, SensorValue::Float(_))
                | (ValueType::Integer, SensorValue::Integer(_))
        );
        if !type_matches {
            return Err(BridgeError::InvalidValue {
                target: self.unique_id.clone(),
                value: value.to_string(),
                reason: format!(
                    "{} writes expect a {:?} value",
                    capability, self.address.value_type
                ),
            });
        }

        debug!("Writing {} to {} ({})", value, self.unique_id, capability);
        self.coordinator
            .source()
            .write(&self.address.name, value)
            .await
    }
}

impl Entity for EntityFacade {
    fn identify(&self) -> &str {
        &self.unique_id
    }

    fn availability(&self) -> Availability {
        if !self.value().is_available() {
            Availability::Unavailable
        } else if self.coordinator.last_update_success() {
            Availability::Available
        } else {
            Availability::Stale
        }
    }

    fn device_context(&self) -> DeviceInfo {
        DeviceInfo::for_zone(&self.context, self.address.zone_id)
    }
}

/// Create one entity per readable address, in registry order.
pub fn build_entities(
    registry: &SensorRegistry,
    coordinator: &Arc<UpdateCoordinator>,
    context: &Arc<EntryContext>,
) -> Vec<EntityFacade> {
    registry
        .readable()
        .map(|address| EntityFacade::new(address.clone(), coordinator.clone(), context.clone()))
        .collect()
}
