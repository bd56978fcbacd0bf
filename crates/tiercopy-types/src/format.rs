//! Human readable formatting for byte counts and remaining time

use std::time::Duration;

/// Format a byte count with binary units, e.g. `1.50 MB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Format a remaining-time estimate as `1h 2m`, `3m 4s` or `5s`
pub fn format_eta(eta: Duration) -> String {
    let total = eta.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0 B")]
    #[case(1023, "1023 B")]
    #[case(1024, "1.00 KB")]
    #[case(1536, "1.50 KB")]
    #[case(1024 * 1024, "1.00 MB")]
    #[case(64 * 1024 * 1024 * 1024, "64.00 GB")]
    fn test_format_bytes(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_bytes(bytes), expected);
    }

    #[rstest]
    #[case(0, "0s")]
    #[case(59, "59s")]
    #[case(60, "1m 0s")]
    #[case(61, "1m 1s")]
    #[case(3599, "59m 59s")]
    #[case(3600, "1h 0m")]
    #[case(3725, "1h 2m")]
    fn test_format_eta(#[case] seconds: u64, #[case] expected: &str) {
        assert_eq!(format_eta(Duration::from_secs(seconds)), expected);
    }

    proptest! {
        #[test]
        fn test_format_eta_shape(seconds in 0u64..1_000_000) {
            let text = format_eta(Duration::from_secs(seconds));
            if seconds >= 3600 {
                prop_assert!(text.contains('h') && !text.ends_with('s'));
            } else if seconds >= 60 {
                prop_assert!(text.contains('m') && text.ends_with('s'));
            } else {
                prop_assert_eq!(text, format!("{}s", seconds));
            }
        }
    }
}
