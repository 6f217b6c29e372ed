/// Test configuration for the scenario player
///
/// A configuration file names the brokers that can be exercised, the test
/// scenarios that can be replayed against them, and the device templates
/// the scenarios publish from.
use serde::{Deserialize, Serialize};

use airq_telemetry::Location;

/// Root of a test configuration file (JSON or RON)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestConfig {
    /// Brokers available to run scenarios against
    pub mqtt_brokers: Vec<BrokerConfig>,

    /// Replayable test scenarios
    pub test_scenarios: Vec<ScenarioConfig>,

    /// Devices the scenarios publish as
    pub device_templates: Vec<DeviceTemplate>,
}

/// One MQTT broker endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Display name used in listings and prompts
    pub name: String,

    pub host: String,
    pub port: u16,

    /// Credentials; leave empty for anonymous brokers
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub description: String,
}

/// One replayable test scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// How many device templates to publish from (taken in file order)
    pub device_count: usize,

    /// Seconds between publish rounds; 0 means a single burst
    pub message_interval: u64,

    /// Total runtime in seconds
    pub test_duration: u64,
}

/// Identity of a simulated device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTemplate {
    pub device_id: String,

    #[serde(default = "default_device_type")]
    pub device_type: String,

    /// Defaults to `sensor_{device_id}_01` when omitted
    #[serde(default)]
    pub sensor_id: Option<String>,

    /// Defaults to the device type when omitted
    #[serde(default)]
    pub sensor_type: Option<String>,

    pub location: Location,
}

fn default_device_type() -> String {
    airq_telemetry::DEFAULT_DEVICE_TYPE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_template_defaults() {
        let json = r#"{
            "device_id": "hcho_009",
            "location": {
                "latitude": 39.9,
                "longitude": 116.4,
                "address": "somewhere"
            }
        }"#;

        let template: DeviceTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(template.device_type, "hcho");
        assert!(template.sensor_id.is_none());
        assert!(template.sensor_type.is_none());
    }

    #[test]
    fn test_broker_config_allows_anonymous() {
        let json = r#"{"name": "open", "host": "localhost", "port": 1883}"#;
        let broker: BrokerConfig = serde_json::from_str(json).unwrap();
        assert!(broker.username.is_empty());
        assert!(broker.password.is_empty());
    }
}
