//! Shared telemetry definitions for the air-quality MQTT tools
//!
//! This crate provides everything the individual tools have in common:
//!
//! - **Topic family**: the fixed `air-quality/{device_type}/{device_id}/...`
//!   topic scheme the monitoring server subscribes to
//! - **Payload types**: serde structs matching the JSON the server parses
//! - **Sample generation**: randomized sensor readings and device status
//!   messages within realistic value ranges
//! - **Alert thresholds**: the formaldehyde warning/critical levels the
//!   server applies on ingest
//!
//! # Example
//!
//! ```rust
//! use airq_telemetry::{generate, TopicSet};
//!
//! let topics = TopicSet::hcho("hcho_001");
//! let reading = generate::reading("hcho_001", "hcho");
//! println!("publish to {}: {}", topics.data(), serde_json::to_string(&reading).unwrap());
//! ```

pub mod alert;
pub mod generate;
pub mod payload;
pub mod topics;

// Re-export commonly used types
pub use alert::{classify, Severity, FORMALDEHYDE_CRITICAL, FORMALDEHYDE_WARNING};
pub use payload::*;
pub use topics::{TopicSet, DEFAULT_DEVICE_TYPE, TOPIC_ROOT};

use thiserror::Error;

/// Errors produced by this crate
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("unknown command action: {0}")]
    UnknownAction(String),
}

/// Firmware version reported by the simulated devices
pub const FIRMWARE_VERSION: &str = "1.2.3";
pub const FIRMWARE_BUILD_DATE: &str = "2024-01-15";
