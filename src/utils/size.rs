/// Bytes as fractional megabytes, for human-facing size reporting
pub fn human_mb(num_bytes: u64) -> f64 {
    num_bytes as f64 / (1024.0 * 1024.0)
}

/// How much smaller the derived text is than the original, as a percentage
/// clamped to `[-100, 100]`.
///
/// `None` when the original is empty or no derived size is known. Negative
/// values mean the derived text is larger than the original; they are
/// reported as-is.
pub fn percent_smaller(original_bytes: u64, derived_bytes: Option<u64>) -> Option<f64> {
    let derived = derived_bytes?;
    if original_bytes == 0 {
        return None;
    }
    let ratio = 1.0 - (derived as f64 / original_bytes.max(1) as f64);
    Some((ratio * 100.0).clamp(-100.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_cases() {
        assert_eq!(percent_smaller(0, Some(10)), None);
        assert_eq!(percent_smaller(100, None), None);
    }

    #[test]
    fn test_percent_smaller() {
        assert_eq!(percent_smaller(100, Some(50)), Some(50.0));
        assert_eq!(percent_smaller(100, Some(0)), Some(100.0));
        assert_eq!(percent_smaller(100, Some(100)), Some(0.0));
    }

    #[test]
    fn test_negative_clamped() {
        // Derived larger than original: legitimate for small dense sources
        assert_eq!(percent_smaller(100, Some(150)), Some(-50.0));
        assert_eq!(percent_smaller(50, Some(100)), Some(-100.0));
        assert_eq!(percent_smaller(10, Some(1000)), Some(-100.0));
    }

    #[test]
    fn test_human_mb() {
        assert_eq!(human_mb(0), 0.0);
        assert_eq!(human_mb(5 * 1024 * 1024), 5.0);
    }
}
