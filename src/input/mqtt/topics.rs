//! Topic layout and payloads of the MQTT surface.
//!
//! ```text
//! {prefix}/{unique_id}/state          retained display value, empty for null
//! {prefix}/{unique_id}/availability   retained online | stale | offline
//! {prefix}/{unique_id}/config         retained entity description
//! {prefix}/service/{name}             incoming command JSON
//! {prefix}/service/{name}/result      reply {"ok", "error", "message_key", "message"}
//! ```

use crate::entity::{Entity, EntityFacade};
use crate::error::Result;
use crate::sensors::ValueType;
use serde::Serialize;
use serde_json::{Value, json};

/// Online marker for the bridge itself, also used as last will.
pub const BRIDGE_ONLINE: &str = "online";
pub const BRIDGE_OFFLINE: &str = "offline";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
}

impl Topics {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn bridge_status(&self) -> String {
        format!("{}/bridge/status", self.prefix)
    }

    pub fn state(&self, unique_id: &str) -> String {
        format!("{}/{}/state", self.prefix, unique_id)
    }

    pub fn availability(&self, unique_id: &str) -> String {
        format!("{}/{}/availability", self.prefix, unique_id)
    }

    pub fn config(&self, unique_id: &str) -> String {
        format!("{}/{}/config", self.prefix, unique_id)
    }

    /// Wildcard filter for incoming service calls.
    pub fn service_filter(&self) -> String {
        format!("{}/service/+", self.prefix)
    }

    pub fn service_result(&self, service: &str) -> String {
        format!("{}/service/{}/result", self.prefix, service)
    }

    /// Service name of an incoming call topic, or `None` for any other topic.
    pub fn parse_service<'a>(&self, topic: &'a str) -> Option<&'a str> {
        let service = topic
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix("/service/")?;
        (!service.is_empty() && !service.contains('/')).then_some(service)
    }
}

/// State payload: the display value, or empty when there is none.
pub fn state_payload(entity: &EntityFacade) -> String {
    entity.display_value().unwrap_or_default()
}

/// Retained description of an entity for consumers of the bridge.
pub fn config_payload(entity: &EntityFacade, topics: &Topics) -> Value {
    let address = entity.address();
    let unique_id = entity.identify();
    let options: Option<Vec<&str>> = match address.value_type {
        ValueType::Enum(variants) => Some(variants.iter().map(|v| v.label).collect()),
        _ => None,
    };
    json!({
        "name": address.name,
        "unique_id": unique_id,
        "state_topic": topics.state(unique_id),
        "availability_topic": topics.availability(unique_id),
        "unit_of_measurement": address.unit,
        "value_type": address.value_type.kind(),
        "options": options,
        "write_capability": address.capabilities.write.map(|c| c.to_string()),
        "device": entity.device_context(),
        "attributes": entity.extra_attributes(),
    })
}

/// Reply to a service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_key: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&Result<()>> for ServiceResult {
    fn from(result: &Result<()>) -> Self {
        match result {
            Ok(()) => Self {
                ok: true,
                error: None,
                message_key: None,
                message: None,
            },
            Err(e) => Self {
                ok: false,
                error: Some(e.translation_key()),
                message_key: e.message_key(),
                message: Some(e.to_string()),
            },
        }
    }
}
