//! Service call payload.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of a write service call.
///
/// `acknowledge_risk` and `value` are kept as raw JSON so that a wrong type is
/// reported as such instead of being coerced. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandRequest {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub acknowledge_risk: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl CommandRequest {
    pub fn new(target: impl Into<String>, acknowledge_risk: bool, value: impl Into<Value>) -> Self {
        Self {
            target: Some(target.into()),
            acknowledge_risk: Some(Value::Bool(acknowledge_risk)),
            value: Some(value.into()),
        }
    }

    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| BridgeError::InvalidPayload(e.to_string()))
    }

    /// Only a literal JSON `true` counts as acknowledgement.
    pub fn is_acknowledged(&self) -> bool {
        matches!(self.acknowledge_risk, Some(Value::Bool(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let request = CommandRequest::from_json(
            r#"{"target": "dhw_setpoint", "acknowledge_risk": true, "value": 55}"#,
        )
        .unwrap();
        assert_eq!(request, CommandRequest::new("dhw_setpoint", true, 55));
        assert!(request.is_acknowledged());
    }

    #[test]
    fn test_acknowledgement_is_never_defaulted_or_coerced() {
        for payload in [
            r#"{"target": "x", "value": 1}"#,
            r#"{"target": "x", "acknowledge_risk": false, "value": 1}"#,
            r#"{"target": "x", "acknowledge_risk": "true", "value": 1}"#,
            r#"{"target": "x", "acknowledge_risk": 1, "value": 1}"#,
            r#"{"target": "x", "acknowledge_risk": null, "value": 1}"#,
        ] {
            let request = CommandRequest::from_json(payload).unwrap();
            assert!(!request.is_acknowledged(), "{}", payload);
        }
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let err = CommandRequest::from_json(
            r#"{"target": "x", "acknowledge_risk": true, "value": 1, "force": true}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidPayload(_)));
        assert!(CommandRequest::from_json("[1, 2]").is_err());
    }
}
