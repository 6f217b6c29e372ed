//! Randomized sample generation for the simulated sensor fleet
//!
//! Value ranges mirror what the real formaldehyde devices report, so the
//! generated traffic exercises the same ingest paths (including the alert
//! thresholds) as production data.

use rand::Rng;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::alert;
use crate::payload::{
    DeviceStatus, FirmwareInfo, Location, Measurements, QualityInfo, SensorReading, StatusInfo,
};

/// Reference coordinates the simulated fleet scatters around
pub const BASE_LATITUDE: f64 = 39.9042;
pub const BASE_LONGITUDE: f64 = 116.4074;
const BASE_ADDRESS: &str = "Chaoyang District, Beijing";

/// Current unix timestamp in seconds
pub fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs()
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Random measurements within the ranges the real sensors report
pub fn measurements() -> Measurements {
    let mut rng = rand::thread_rng();
    Measurements {
        formaldehyde: round_to(rng.gen_range(0.01..0.15), 3),
        temperature: round_to(rng.gen_range(18.0..30.0), 1),
        humidity: round_to(rng.gen_range(40.0..80.0), 1),
        battery: rng.gen_range(20..=100),
    }
}

/// Random signal strength in dBm
pub fn signal_strength() -> i32 {
    rand::thread_rng().gen_range(-90..=-30)
}

/// Install location jittered around the reference coordinates
pub fn location() -> Location {
    let mut rng = rand::thread_rng();
    Location {
        latitude: BASE_LATITUDE + rng.gen_range(-0.01..0.01),
        longitude: BASE_LONGITUDE + rng.gen_range(-0.01..0.01),
        address: BASE_ADDRESS.to_string(),
    }
}

/// Randomized sensor reading for a device, with the default sensor identity
/// and a jittered location
pub fn reading(device_id: &str, device_type: &str) -> SensorReading {
    reading_at(device_id, device_type, None, None, location())
}

/// Randomized sensor reading with explicit sensor identity and location,
/// used when publishing from a configured device template
pub fn reading_at(
    device_id: &str,
    device_type: &str,
    sensor_id: Option<&str>,
    sensor_type: Option<&str>,
    location: Location,
) -> SensorReading {
    let data = measurements();
    let quality = QualityInfo {
        signal_strength: signal_strength(),
        data_quality: alert::data_quality(data.formaldehyde).to_string(),
    };
    SensorReading {
        device_id: device_id.to_string(),
        device_type: device_type.to_string(),
        sensor_id: sensor_id
            .map(str::to_string)
            .unwrap_or_else(|| format!("sensor_{}_01", device_id)),
        sensor_type: sensor_type.unwrap_or(device_type).to_string(),
        timestamp: unix_ts(),
        data,
        location,
        quality,
    }
}

/// Randomized device health message. `last_data_time` trails the current
/// time by up to a minute, as on the real devices.
pub fn status(device_id: &str, device_type: &str) -> DeviceStatus {
    let mut rng = rand::thread_rng();
    let now = unix_ts();
    DeviceStatus {
        device_id: device_id.to_string(),
        device_type: device_type.to_string(),
        timestamp: now,
        status: StatusInfo {
            online: true,
            battery_level: rng.gen_range(20..=100),
            signal_strength: rng.gen_range(-90..=-30),
            last_data_time: now - rng.gen_range(0..=60),
            error_code: 0,
            error_message: String::new(),
        },
        firmware: FirmwareInfo::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurements_stay_in_range() {
        for _ in 0..100 {
            let m = measurements();
            assert!((0.01..=0.15).contains(&m.formaldehyde));
            assert!((18.0..=30.0).contains(&m.temperature));
            assert!((40.0..=80.0).contains(&m.humidity));
            assert!((20..=100).contains(&m.battery));
        }
    }

    #[test]
    fn test_measurements_are_rounded() {
        for _ in 0..20 {
            let m = measurements();
            assert_eq!(m.formaldehyde, (m.formaldehyde * 1000.0).round() / 1000.0);
            assert_eq!(m.temperature, (m.temperature * 10.0).round() / 10.0);
        }
    }

    #[test]
    fn test_reading_defaults_sensor_identity() {
        let r = reading("hcho_007", "hcho");
        assert_eq!(r.sensor_id, "sensor_hcho_007_01");
        assert_eq!(r.sensor_type, "hcho");
        assert!(r.timestamp > 0);
    }

    #[test]
    fn test_reading_at_keeps_template_identity() {
        let loc = Location {
            latitude: 31.2304,
            longitude: 121.4737,
            address: "Pudong, Shanghai".to_string(),
        };
        let r = reading_at("hcho_002", "hcho", Some("sensor_custom"), Some("hcho"), loc);
        assert_eq!(r.sensor_id, "sensor_custom");
        assert_eq!(r.location.latitude, 31.2304);
    }

    #[test]
    fn test_quality_label_tracks_concentration() {
        for _ in 0..100 {
            let r = reading("hcho_001", "hcho");
            let expected = if r.data.formaldehyde < crate::FORMALDEHYDE_CRITICAL {
                "good"
            } else {
                "poor"
            };
            assert_eq!(r.quality.data_quality, expected);
        }
    }

    #[test]
    fn test_location_jitter_is_bounded() {
        for _ in 0..100 {
            let l = location();
            assert!((l.latitude - BASE_LATITUDE).abs() <= 0.01);
            assert!((l.longitude - BASE_LONGITUDE).abs() <= 0.01);
        }
    }

    #[test]
    fn test_status_last_data_time_trails_timestamp() {
        let s = status("hcho_001", "hcho");
        assert!(s.status.online);
        assert!(s.status.last_data_time <= s.timestamp);
        assert!(s.timestamp - s.status.last_data_time <= 60);
        assert_eq!(s.status.error_code, 0);
    }
}
