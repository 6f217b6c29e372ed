//! Topic scheme used by the air-quality monitoring server
//!
//! Every device owns five topics under a common root:
//!
//! ```text
//! air-quality/{device_type}/{device_id}/data      sensor readings (uplink)
//! air-quality/{device_type}/{device_id}/status    device health (uplink)
//! air-quality/{device_type}/{device_id}/config    configuration push (downlink)
//! air-quality/{device_type}/{device_id}/command   command dispatch (downlink)
//! air-quality/{device_type}/{device_id}/response  command replies (uplink)
//! ```

/// Root segment of every topic the server subscribes to
pub const TOPIC_ROOT: &str = "air-quality";

/// Device type used by the formaldehyde sensor fleet
pub const DEFAULT_DEVICE_TYPE: &str = "hcho";

/// The set of topics belonging to one device
#[derive(Debug, Clone)]
pub struct TopicSet {
    device_type: String,
    device_id: String,
}

impl TopicSet {
    pub fn new(device_type: &str, device_id: &str) -> Self {
        Self {
            device_type: device_type.to_string(),
            device_id: device_id.to_string(),
        }
    }

    /// Topic set for a formaldehyde device
    pub fn hcho(device_id: &str) -> Self {
        Self::new(DEFAULT_DEVICE_TYPE, device_id)
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn data(&self) -> String {
        self.suffixed("data")
    }

    pub fn status(&self) -> String {
        self.suffixed("status")
    }

    pub fn config(&self) -> String {
        self.suffixed("config")
    }

    pub fn command(&self) -> String {
        self.suffixed("command")
    }

    pub fn response(&self) -> String {
        self.suffixed("response")
    }

    fn suffixed(&self, leaf: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            TOPIC_ROOT, self.device_type, self.device_id, leaf
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_set_formats_all_leaves() {
        let topics = TopicSet::hcho("hcho_001");

        assert_eq!(topics.data(), "air-quality/hcho/hcho_001/data");
        assert_eq!(topics.status(), "air-quality/hcho/hcho_001/status");
        assert_eq!(topics.config(), "air-quality/hcho/hcho_001/config");
        assert_eq!(topics.command(), "air-quality/hcho/hcho_001/command");
        assert_eq!(topics.response(), "air-quality/hcho/hcho_001/response");
    }

    #[test]
    fn test_topic_set_custom_device_type() {
        let topics = TopicSet::new("pm25", "pm_042");
        assert_eq!(topics.data(), "air-quality/pm25/pm_042/data");
    }
}
