use super::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults_match_device_fleet() {
        let args = Args::try_parse_from(["device-sim"]).unwrap();

        assert_eq!(args.host, "localhost");
        assert_eq!(args.port, 1883);
        assert_eq!(args.username, "admin");
        assert_eq!(args.device_id, "hcho_001");
        assert_eq!(args.interval, 30);
        assert_eq!(args.count, 10);
        assert!(!args.subscribe);
        assert!(!args.simulate);
    }

    #[test]
    fn test_args_simulation_mode() {
        let args = Args::try_parse_from([
            "device-sim",
            "--simulate",
            "--interval",
            "10",
            "--device-id",
            "demo_device_003",
        ])
        .unwrap();

        assert!(args.simulate);
        assert_eq!(args.interval, 10);
        assert_eq!(args.device_id, "demo_device_003");
    }

    #[test]
    fn test_args_short_flags() {
        let args = Args::try_parse_from(["device-sim", "-d", "hcho_042", "-c", "3", "-i", "5"]).unwrap();

        assert_eq!(args.device_id, "hcho_042");
        assert_eq!(args.count, 3);
        assert_eq!(args.interval, 5);
    }

    #[test]
    fn test_args_reject_out_of_range_port() {
        assert!(Args::try_parse_from(["device-sim", "--port", "70000"]).is_err());
    }
}
