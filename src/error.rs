use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Sensor not found: {0}")]
    NotFound(String),

    #[error("Entity {0} not found")]
    TargetNotFound(String),

    #[error("Entity {target} does not support {operation}")]
    UnsupportedOperation { target: String, operation: String },

    #[error("Must acknowledge risk to call {operation}")]
    RiskNotAcknowledged {
        operation: String,
        message_key: &'static str,
    },

    #[error("Invalid value {value} for {target}: {reason}")]
    InvalidValue {
        target: String,
        value: String,
        reason: String,
    },

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Invalid service payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid sensor registry: {0}")]
    InvalidRegistry(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Data source request timed out: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

impl BridgeError {
    /// Stable key for user-facing messages, reported alongside the text.
    pub fn translation_key(&self) -> &'static str {
        match self {
            BridgeError::NotFound(_) => "sensor_not_found",
            BridgeError::TargetNotFound(_) => "entity_not_found",
            BridgeError::UnsupportedOperation { .. } => "entity_not_supported",
            BridgeError::RiskNotAcknowledged { .. } => "risk_not_acknowledged",
            BridgeError::InvalidValue { .. } => "invalid_value",
            BridgeError::UnknownService(_) => "unknown_service",
            BridgeError::InvalidPayload(_) => "invalid_payload",
            BridgeError::InvalidRegistry(_) => "invalid_registry",
            BridgeError::DataSource(_) | BridgeError::Timeout(_) => "data_source_error",
            BridgeError::Config(_) => "invalid_config",
            BridgeError::IoError(_) | BridgeError::SerdeJsonError(_) => "internal_error",
        }
    }
}

impl BridgeError {
    /// Service-specific message key, where the failure has one.
    pub fn message_key(&self) -> Option<&'static str> {
        match self {
            BridgeError::RiskNotAcknowledged { message_key, .. } => Some(*message_key),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_carry_context() {
        let err = BridgeError::UnsupportedOperation {
            target: "dhw_setpoint".to_string(),
            operation: "set_power".to_string(),
        };
        assert_eq!(err.to_string(), "Entity dhw_setpoint does not support set_power");
        assert_eq!(err.translation_key(), "entity_not_supported");

        let err = BridgeError::RiskNotAcknowledged {
            operation: "set_battery".to_string(),
            message_key: "set_battery_risk_not_acknowledged",
        };
        assert_eq!(err.to_string(), "Must acknowledge risk to call set_battery");
        assert_eq!(err.translation_key(), "risk_not_acknowledged");
        assert_eq!(err.message_key(), Some("set_battery_risk_not_acknowledged"));
        assert_eq!(BridgeError::TargetNotFound("x".to_string()).message_key(), None);
    }

    #[test]
    fn test_timeouts_share_data_source_key() {
        let err = BridgeError::Timeout("fetch".to_string());
        assert_eq!(err.translation_key(), "data_source_error");
    }
}
