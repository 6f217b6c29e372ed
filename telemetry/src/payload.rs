//! Payload structures for the air-quality MQTT topics
//!
//! Field names and nesting match the JSON the monitoring server parses, so
//! anything published by the tools is indistinguishable from real device
//! traffic on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{TelemetryError, FIRMWARE_BUILD_DATE, FIRMWARE_VERSION};

/// Sensor reading published on the `data` topic
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SensorReading {
    pub device_id: String,
    pub device_type: String,
    pub sensor_id: String,
    pub sensor_type: String,
    /// Unix timestamp in seconds
    pub timestamp: u64,
    pub data: Measurements,
    pub location: Location,
    pub quality: QualityInfo,
}

/// Measured values carried by a reading
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Measurements {
    /// Formaldehyde concentration in mg/m³
    pub formaldehyde: f64,
    /// Temperature in °C
    pub temperature: f64,
    /// Relative humidity in %
    pub humidity: f64,
    /// Battery charge in %
    pub battery: u8,
}

/// Where the device is installed
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// Signal and data-quality metadata attached to a reading
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QualityInfo {
    /// Signal strength in dBm
    pub signal_strength: i32,
    /// "good" or "poor"
    pub data_quality: String,
}

/// Device health message published on the `status` topic
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeviceStatus {
    pub device_id: String,
    pub device_type: String,
    pub timestamp: u64,
    pub status: StatusInfo,
    pub firmware: FirmwareInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StatusInfo {
    pub online: bool,
    pub battery_level: u8,
    pub signal_strength: i32,
    pub last_data_time: u64,
    pub error_code: i32,
    pub error_message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FirmwareInfo {
    pub version: String,
    pub build_date: String,
}

impl Default for FirmwareInfo {
    fn default() -> Self {
        Self {
            version: FIRMWARE_VERSION.to_string(),
            build_date: FIRMWARE_BUILD_DATE.to_string(),
        }
    }
}

/// Configuration push sent to a device on the `config` topic
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfigPush {
    pub device_id: String,
    pub timestamp: u64,
    pub config: ConfigBody,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfigBody {
    /// Reporting interval in seconds
    pub report_interval: u64,
    pub thresholds: Thresholds,
    pub calibration: Calibration,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Thresholds {
    pub formaldehyde_warning: f64,
    pub formaldehyde_critical: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Calibration {
    pub enabled: bool,
    /// Calibration interval in seconds
    pub interval: u64,
}

impl ConfigPush {
    /// The configuration the server pushes by default: 60 s reporting,
    /// stock alert thresholds, daily calibration.
    pub fn standard(device_id: &str, timestamp: u64) -> Self {
        Self {
            device_id: device_id.to_string(),
            timestamp,
            config: ConfigBody {
                report_interval: 60,
                thresholds: Thresholds {
                    formaldehyde_warning: crate::FORMALDEHYDE_WARNING,
                    formaldehyde_critical: crate::FORMALDEHYDE_CRITICAL,
                },
                calibration: Calibration {
                    enabled: true,
                    interval: 86400,
                },
            },
        }
    }
}

/// Command dispatch sent to a device on the `command` topic
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommandRequest {
    pub device_id: String,
    pub timestamp: u64,
    pub command: CommandBody,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommandBody {
    pub action: String,
    pub parameters: CommandParameters,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommandParameters {
    /// Present for calibrate, null otherwise
    pub duration: Option<u64>,
}

/// Commands understood by the simulated devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Calibrate,
    Reboot,
    GetConfig,
    UpdateConfig,
}

impl CommandAction {
    pub const ALL: [CommandAction; 4] = [
        CommandAction::Calibrate,
        CommandAction::Reboot,
        CommandAction::GetConfig,
        CommandAction::UpdateConfig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandAction::Calibrate => "calibrate",
            CommandAction::Reboot => "reboot",
            CommandAction::GetConfig => "get_config",
            CommandAction::UpdateConfig => "update_config",
        }
    }

    /// Build the request the server would send for this command.
    /// Calibration runs carry a fixed 300 s duration.
    pub fn request(&self, device_id: &str, timestamp: u64) -> CommandRequest {
        let duration = match self {
            CommandAction::Calibrate => Some(300),
            _ => None,
        };
        CommandRequest {
            device_id: device_id.to_string(),
            timestamp,
            command: CommandBody {
                action: self.as_str().to_string(),
                parameters: CommandParameters { duration },
            },
        }
    }
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandAction {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calibrate" => Ok(CommandAction::Calibrate),
            "reboot" => Ok(CommandAction::Reboot),
            "get_config" => Ok(CommandAction::GetConfig),
            "update_config" => Ok(CommandAction::UpdateConfig),
            other => Err(TelemetryError::UnknownAction(other.to_string())),
        }
    }
}

/// Reply a device publishes on its `response` topic after executing a command
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CommandReply {
    pub device_id: String,
    pub timestamp: u64,
    pub command: String,
    pub response: serde_json::Value,
}

impl CommandReply {
    /// Canned reply body for a command, matching what the firmware reports.
    /// Unknown actions produce an error body rather than failing.
    pub fn for_action(device_id: &str, action: &str, timestamp: u64) -> Self {
        let response = match CommandAction::from_str(action) {
            Ok(CommandAction::Calibrate) => serde_json::json!({
                "status": "success",
                "message": "calibration complete",
                "calibration_time": timestamp,
                "calibration_duration": 300,
            }),
            Ok(CommandAction::Reboot) => serde_json::json!({
                "status": "success",
                "message": "device rebooting",
                "reboot_time": timestamp,
            }),
            Ok(CommandAction::GetConfig) => serde_json::json!({
                "status": "success",
                "config": {
                    "report_interval": 30,
                    "formaldehyde_warning": crate::FORMALDEHYDE_WARNING,
                    "formaldehyde_critical": crate::FORMALDEHYDE_CRITICAL,
                    "calibration_enabled": true,
                    "calibration_interval": 86400,
                },
            }),
            Ok(CommandAction::UpdateConfig) => serde_json::json!({
                "status": "success",
                "message": "configuration updated",
                "updated_at": timestamp,
            }),
            Err(_) => serde_json::json!({
                "status": "error",
                "message": format!("unknown command: {}", action),
            }),
        };

        Self {
            device_id: device_id.to_string(),
            timestamp,
            command: action.to_string(),
            response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_reading_serialization_shape() {
        let reading = SensorReading {
            device_id: "hcho_001".to_string(),
            device_type: "hcho".to_string(),
            sensor_id: "sensor_hcho_001_01".to_string(),
            sensor_type: "hcho".to_string(),
            timestamp: 1700000000,
            data: Measurements {
                formaldehyde: 0.05,
                temperature: 22.5,
                humidity: 45.0,
                battery: 85,
            },
            location: Location {
                latitude: 39.9042,
                longitude: 116.4074,
                address: "Chaoyang District, Beijing".to_string(),
            },
            quality: QualityInfo {
                signal_strength: -65,
                data_quality: "good".to_string(),
            },
        };

        let json = serde_json::to_string(&reading).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["device_id"], "hcho_001");
        assert_eq!(parsed["data"]["formaldehyde"], 0.05);
        assert_eq!(parsed["data"]["battery"], 85);
        assert_eq!(parsed["location"]["latitude"], 39.9042);
        assert_eq!(parsed["quality"]["data_quality"], "good");
    }

    #[test]
    fn test_device_status_serialization_shape() {
        let status = DeviceStatus {
            device_id: "hcho_001".to_string(),
            device_type: "hcho".to_string(),
            timestamp: 1700000000,
            status: StatusInfo {
                online: true,
                battery_level: 90,
                signal_strength: -55,
                last_data_time: 1699999970,
                error_code: 0,
                error_message: String::new(),
            },
            firmware: FirmwareInfo::default(),
        };

        let parsed: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&status).unwrap()).unwrap();

        assert_eq!(parsed["status"]["online"], true);
        assert_eq!(parsed["status"]["error_code"], 0);
        assert_eq!(parsed["firmware"]["version"], FIRMWARE_VERSION);
    }

    #[test]
    fn test_command_request_duration_only_for_calibrate() {
        let calibrate = CommandAction::Calibrate.request("hcho_001", 1700000000);
        assert_eq!(calibrate.command.parameters.duration, Some(300));

        let reboot = CommandAction::Reboot.request("hcho_001", 1700000000);
        assert_eq!(reboot.command.parameters.duration, None);

        // A null duration must stay in the serialized form
        let parsed: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&reboot).unwrap()).unwrap();
        assert!(parsed["command"]["parameters"]["duration"].is_null());
    }

    #[test]
    fn test_command_action_round_trip() {
        for action in CommandAction::ALL {
            assert_eq!(action.as_str().parse::<CommandAction>().unwrap(), action);
        }
        assert!("self_destruct".parse::<CommandAction>().is_err());
    }

    #[test]
    fn test_command_reply_known_action() {
        let reply = CommandReply::for_action("hcho_001", "get_config", 1700000000);
        assert_eq!(reply.command, "get_config");
        assert_eq!(reply.response["status"], "success");
        assert_eq!(reply.response["config"]["report_interval"], 30);
    }

    #[test]
    fn test_command_reply_unknown_action() {
        let reply = CommandReply::for_action("hcho_001", "self_destruct", 1700000000);
        assert_eq!(reply.response["status"], "error");
        assert_eq!(reply.response["message"], "unknown command: self_destruct");
    }

    #[test]
    fn test_standard_config_push_uses_alert_thresholds() {
        let push = ConfigPush::standard("hcho_001", 1700000000);
        assert_eq!(push.config.report_interval, 60);
        assert_eq!(
            push.config.thresholds.formaldehyde_warning,
            crate::FORMALDEHYDE_WARNING
        );
        assert_eq!(
            push.config.thresholds.formaldehyde_critical,
            crate::FORMALDEHYDE_CRITICAL
        );
        assert!(push.config.calibration.enabled);
    }
}
