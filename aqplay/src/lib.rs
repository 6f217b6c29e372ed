//! aqplay - Air-Quality MQTT Scenario Player
//!
//! This library provides functionality for parsing, validating, and working
//! with the test configurations replayed by the `aqplay` binary.

pub mod config_types;

pub use config_types::*;

/// Validate a test configuration
pub fn validate_config(config: &TestConfig) -> Result<(), String> {
    if config.mqtt_brokers.is_empty() {
        return Err("Configuration must define at least one MQTT broker".into());
    }
    if config.test_scenarios.is_empty() {
        return Err("Configuration must define at least one test scenario".into());
    }

    // Device ids must be unique so the published traffic is attributable
    let mut seen = std::collections::HashSet::new();
    for template in &config.device_templates {
        if !seen.insert(template.device_id.as_str()) {
            return Err(format!(
                "Duplicate device template id '{}'",
                template.device_id
            ));
        }
    }

    for scenario in &config.test_scenarios {
        if scenario.device_count == 0 {
            return Err(format!(
                "Scenario '{}' must use at least one device",
                scenario.name
            ));
        }
        if scenario.device_count > config.device_templates.len() {
            return Err(format!(
                "Scenario '{}' wants {} devices but only {} templates are defined",
                scenario.name,
                scenario.device_count,
                config.device_templates.len()
            ));
        }
        // Timed scenarios must actually run for a while; interval 0 is the
        // single-burst case and may pair with any duration
        if scenario.message_interval > 0 && scenario.test_duration == 0 {
            return Err(format!(
                "Scenario '{}' has a message interval but zero duration",
                scenario.name
            ));
        }
    }

    Ok(())
}

/// Parse a RON configuration string
pub fn parse_ron_config(content: &str) -> Result<TestConfig, String> {
    ron::from_str(content).map_err(|e| format!("RON parsing error: {}", e))
}

/// Parse a JSON configuration string
pub fn parse_json_config(content: &str) -> Result<TestConfig, String> {
    serde_json::from_str(content).map_err(|e| format!("JSON parsing error: {}", e))
}

/// Turn a 1-based broker/scenario number (as typed by the operator) into an
/// index into a list of the given length
pub fn resolve_index(number: usize, len: usize) -> Result<usize, String> {
    if number == 0 || number > len {
        return Err(format!(
            "Number {} is out of range, expected 1..={}",
            number, len
        ));
    }
    Ok(number - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use airq_telemetry::Location;

    fn test_location() -> Location {
        Location {
            latitude: 39.9042,
            longitude: 116.4074,
            address: "Chaoyang District, Beijing".to_string(),
        }
    }

    fn create_test_config() -> TestConfig {
        TestConfig {
            mqtt_brokers: vec![BrokerConfig {
                name: "local".to_string(),
                host: "localhost".to_string(),
                port: 1883,
                username: "admin".to_string(),
                password: "password".to_string(),
                description: "Local development broker".to_string(),
            }],
            test_scenarios: vec![ScenarioConfig {
                name: "smoke".to_string(),
                description: "One quick round".to_string(),
                device_count: 1,
                message_interval: 5,
                test_duration: 30,
            }],
            device_templates: vec![DeviceTemplate {
                device_id: "hcho_001".to_string(),
                device_type: "hcho".to_string(),
                sensor_id: None,
                sensor_type: None,
                location: test_location(),
            }],
        }
    }

    #[test]
    fn test_validate_config_success() {
        assert!(validate_config(&create_test_config()).is_ok());
    }

    #[test]
    fn test_validate_config_no_brokers() {
        let mut config = create_test_config();
        config.mqtt_brokers.clear();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("at least one MQTT broker"));
    }

    #[test]
    fn test_validate_config_no_scenarios() {
        let mut config = create_test_config();
        config.test_scenarios.clear();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("at least one test scenario"));
    }

    #[test]
    fn test_validate_config_too_many_devices() {
        let mut config = create_test_config();
        config.test_scenarios[0].device_count = 4;

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("only 1 templates are defined"));
    }

    #[test]
    fn test_validate_config_duplicate_device_ids() {
        let mut config = create_test_config();
        let duplicate = config.device_templates[0].clone();
        config.device_templates.push(duplicate);

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Duplicate device template id"));
    }

    #[test]
    fn test_validate_config_zero_duration() {
        let mut config = create_test_config();
        config.test_scenarios[0].test_duration = 0;

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("zero duration"));
    }

    #[test]
    fn test_validate_config_burst_with_zero_duration_is_fine() {
        let mut config = create_test_config();
        config.test_scenarios[0].message_interval = 0;
        config.test_scenarios[0].test_duration = 0;

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_parse_json_config_valid() {
        let json = r#"{
            "mqtt_brokers": [
                {
                    "name": "local",
                    "host": "localhost",
                    "port": 1883,
                    "username": "admin",
                    "password": "password",
                    "description": "Local development broker"
                }
            ],
            "test_scenarios": [
                {
                    "name": "smoke",
                    "description": "One quick round",
                    "device_count": 1,
                    "message_interval": 0,
                    "test_duration": 10
                }
            ],
            "device_templates": [
                {
                    "device_id": "hcho_001",
                    "device_type": "hcho",
                    "location": {
                        "latitude": 39.9042,
                        "longitude": 116.4074,
                        "address": "Chaoyang District, Beijing"
                    }
                }
            ]
        }"#;

        let config = parse_json_config(json).unwrap();
        assert_eq!(config.mqtt_brokers.len(), 1);
        assert_eq!(config.test_scenarios[0].name, "smoke");
        assert_eq!(config.device_templates[0].device_id, "hcho_001");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_parse_ron_config_valid() {
        let ron_content = r#"(
            mqtt_brokers: [
                (
                    name: "local",
                    host: "localhost",
                    port: 1883,
                    username: "admin",
                    password: "password",
                    description: "Local development broker",
                ),
            ],
            test_scenarios: [
                (
                    name: "smoke",
                    description: "One quick round",
                    device_count: 1,
                    message_interval: 0,
                    test_duration: 10,
                ),
            ],
            device_templates: [
                (
                    device_id: "hcho_001",
                    location: (
                        latitude: 39.9042,
                        longitude: 116.4074,
                        address: "Chaoyang District, Beijing",
                    ),
                ),
            ],
        )"#;

        let result = parse_ron_config(ron_content);
        if let Err(e) = &result {
            println!("RON parsing error: {}", e);
        }
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config.mqtt_brokers[0].name, "local");
        assert_eq!(config.device_templates[0].device_type, "hcho");
    }

    #[test]
    fn test_parse_json_config_invalid() {
        let result = parse_json_config("not a config {");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("JSON parsing error"));
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(1, 3).unwrap(), 0);
        assert_eq!(resolve_index(3, 3).unwrap(), 2);
        assert!(resolve_index(0, 3).is_err());
        assert!(resolve_index(4, 3).is_err());
    }
}
