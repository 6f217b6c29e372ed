use super::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_incoming_valid_json() {
        let payload = br#"{"device_id":"hcho_001","response":{"status":"success"}}"#;
        let message = parse_incoming("air-quality/hcho/hcho_001/response", payload).unwrap();

        assert_eq!(message.topic, "air-quality/hcho/hcho_001/response");
        assert_eq!(message.payload["device_id"], "hcho_001");
        assert_eq!(message.payload["response"]["status"], "success");
    }

    #[test]
    fn test_parse_incoming_rejects_non_json() {
        assert!(parse_incoming("air-quality/hcho/hcho_001/response", b"not json").is_none());
    }

    #[test]
    fn test_all_phases_are_valid_test_types() {
        for phase in ["config", "command", "response", "all"] {
            assert!(TEST_TYPES.contains(&phase));
        }
        assert!(!TEST_TYPES.contains(&"destroy"));
    }
}
