use crate::device::slugify;
use crate::error::{BridgeError, Result};
use crate::sensors::table::MAX_ZONES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (key, value) in parse_dotenv(&content) {
        // Only set if not already set (env vars take precedence)
        if std::env::var(key).is_err() {
            // SAFETY: We're single-threaded at this point (called before any async runtime)
            unsafe { std::env::set_var(key, value) };
        }
    }
}

/// Split `.env` content into key/value pairs, skipping blanks and comments.
fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let mut value = value.trim();

            // Remove surrounding quotes if present
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }
            Some((key.trim(), value))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub heatpump: HeatpumpConfig,
    pub mqtt: MqttConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatpumpConfig {
    /// Hostname or IP of the Navigator controller
    pub hostname: String,
    pub port: u16,
    pub slave_id: u8,
    /// Human-facing device name
    pub display_name: String,
    /// Stable identifier of this bridge instance; derived from the hostname when unset
    pub entry_id: Option<String>,
    /// Number of installed zone modules
    pub zones: u8,
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl HeatpumpConfig {
    pub fn entry_id(&self) -> String {
        self.entry_id
            .clone()
            .unwrap_or_else(|| format!("idm_{}", slugify(&self.hostname)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub enabled: bool,
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Topic prefix; derived from the heat pump hostname when unset
    pub topic_prefix: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            heatpump: HeatpumpConfig {
                hostname: "idm-heatpump.local".to_string(),
                port: 502,
                slave_id: 1,
                display_name: "IDM Heat Pump".to_string(),
                entry_id: None,
                zones: 0,
                poll_interval_secs: 30,
                timeout_secs: 5,
            },
            mqtt: MqttConfig {
                enabled: true,
                broker_host: "localhost".to_string(),
                broker_port: 1883,
                client_id: format!(
                    "idm-heatpump-bridge-{}",
                    slugify(&gethostname::gethostname().to_string_lossy())
                ),
                username: None,
                password: None,
                topic_prefix: None,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Heat pump configuration
        if let Ok(hostname) = std::env::var("IDM_HOSTNAME") {
            config.heatpump.hostname = hostname;
        }
        if let Ok(port) = std::env::var("IDM_PORT")
            && let Ok(p) = port.parse()
        {
            config.heatpump.port = p;
        }
        if let Ok(slave_id) = std::env::var("IDM_SLAVE_ID")
            && let Ok(s) = slave_id.parse()
        {
            config.heatpump.slave_id = s;
        }
        if let Ok(name) = std::env::var("IDM_DISPLAY_NAME") {
            config.heatpump.display_name = name;
        }
        if let Ok(entry_id) = std::env::var("IDM_ENTRY_ID") {
            config.heatpump.entry_id = Some(entry_id);
        }
        if let Ok(zones) = std::env::var("IDM_ZONES")
            && let Ok(z) = zones.parse()
        {
            config.heatpump.zones = z;
        }
        if let Ok(interval) = std::env::var("IDM_POLL_INTERVAL_SECS")
            && let Ok(i) = interval.parse()
        {
            config.heatpump.poll_interval_secs = i;
        }
        if let Ok(timeout) = std::env::var("IDM_TIMEOUT_SECS")
            && let Ok(t) = timeout.parse()
        {
            config.heatpump.timeout_secs = t;
        }

        // MQTT configuration
        if let Ok(enabled) = std::env::var("MQTT_ENABLED")
            && let Ok(e) = enabled.parse()
        {
            config.mqtt.enabled = e;
        }
        if let Ok(host) = std::env::var("MQTT_BROKER_HOST") {
            config.mqtt.broker_host = host;
        }
        if let Ok(port) = std::env::var("MQTT_BROKER_PORT")
            && let Ok(p) = port.parse()
        {
            config.mqtt.broker_port = p;
        }
        if let Ok(client_id) = std::env::var("MQTT_CLIENT_ID") {
            config.mqtt.client_id = client_id;
        }
        if let Ok(username) = std::env::var("MQTT_USERNAME") {
            config.mqtt.username = Some(username);
        }
        if let Ok(password) = std::env::var("MQTT_PASSWORD") {
            config.mqtt.password = Some(password);
        }
        if let Ok(prefix) = std::env::var("MQTT_TOPIC_PREFIX") {
            config.mqtt.topic_prefix = Some(prefix);
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.heatpump.hostname.trim().is_empty() {
            return Err(BridgeError::Config("heat pump hostname is empty".to_string()));
        }
        if self.heatpump.poll_interval_secs == 0 {
            return Err(BridgeError::Config("poll interval must be positive".to_string()));
        }
        if self.heatpump.timeout_secs == 0 {
            return Err(BridgeError::Config("timeout must be positive".to_string()));
        }
        if self.heatpump.zones > MAX_ZONES {
            return Err(BridgeError::Config(format!(
                "at most {} zones are supported, got {}",
                MAX_ZONES, self.heatpump.zones
            )));
        }
        Ok(())
    }

    pub fn topic_prefix(&self) -> String {
        self.mqtt
            .topic_prefix
            .clone()
            .unwrap_or_else(|| format!("idm_heatpump/{}", slugify(&self.heatpump.hostname)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotenv() {
        let content = "# comment\n\nIDM_HOSTNAME = 10.0.0.40\n\
                       IDM_DISPLAY_NAME=\"Heat Pump Cellar\"\nEMPTY=\nbroken line\n";
        let pairs = parse_dotenv(content);
        assert_eq!(
            pairs,
            vec![
                ("IDM_HOSTNAME", "10.0.0.40"),
                ("IDM_DISPLAY_NAME", "Heat Pump Cellar"),
                ("EMPTY", ""),
            ]
        );
    }

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.heatpump.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_entry_id_derived_from_hostname() {
        let mut config = Config::default();
        config.heatpump.hostname = "10.0.0.40".to_string();
        assert_eq!(config.heatpump.entry_id(), "idm_10_0_0_40");
        assert_eq!(config.topic_prefix(), "idm_heatpump/10_0_0_40");

        config.heatpump.entry_id = Some("01HXYZ".to_string());
        assert_eq!(config.heatpump.entry_id(), "01HXYZ");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.heatpump.zones = MAX_ZONES + 1;
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));

        let mut config = Config::default();
        config.heatpump.poll_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.heatpump.hostname = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
