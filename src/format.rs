//! Human-readable duration labels.

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

/// Format a second count as a compact label: `"0m"`, `"45m"`, `"1h 1m"`, `"2d 3h 0m"`.
///
/// Seconds are dropped, so anything under a minute renders as `"0m"`.
pub fn format_duration(secs: u64) -> String {
    let days = secs / SECS_PER_DAY;
    let hours = (secs % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (secs % SECS_PER_HOUR) / SECS_PER_MINUTE;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_sub_minute() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(59), "0m");
    }

    #[test]
    fn test_minutes_only() {
        assert_eq!(format_duration(60), "1m");
        assert_eq!(format_duration(600), "10m");
        assert_eq!(format_duration(3599), "59m");
    }

    #[test]
    fn test_hours_drop_seconds() {
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(3661), "1h 1m");
    }

    #[test]
    fn test_multiple_days() {
        assert_eq!(format_duration(90061), "1d 1h 1m");
        assert_eq!(format_duration(3 * SECS_PER_DAY), "3d 0h 0m");
    }

    #[test]
    fn test_max_value_does_not_overflow() {
        let label = format_duration(u64::MAX);
        assert!(label.ends_with('m'));
        assert!(label.contains('d'));
    }
}
