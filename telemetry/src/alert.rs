//! Formaldehyde alert thresholds applied by the monitoring server on ingest

/// Concentration above which the server raises a warning alert (mg/m³)
pub const FORMALDEHYDE_WARNING: f64 = 0.08;

/// Concentration above which the server raises a critical alert (mg/m³)
pub const FORMALDEHYDE_CRITICAL: f64 = 0.10;

/// Severity bucket for a formaldehyde concentration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

/// Classify a concentration against the server's alert rules
pub fn classify(formaldehyde: f64) -> Severity {
    if formaldehyde >= FORMALDEHYDE_CRITICAL {
        Severity::Critical
    } else if formaldehyde >= FORMALDEHYDE_WARNING {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

/// Data-quality label the devices attach to a reading
pub fn data_quality(formaldehyde: f64) -> &'static str {
    if formaldehyde < FORMALDEHYDE_CRITICAL {
        "good"
    } else {
        "poor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(0.05), Severity::Normal);
        assert_eq!(classify(0.08), Severity::Warning);
        assert_eq!(classify(0.099), Severity::Warning);
        assert_eq!(classify(0.10), Severity::Critical);
        assert_eq!(classify(0.15), Severity::Critical);
    }

    #[test]
    fn test_data_quality_label() {
        assert_eq!(data_quality(0.05), "good");
        assert_eq!(data_quality(0.099), "good");
        assert_eq!(data_quality(0.10), "poor");
    }
}
