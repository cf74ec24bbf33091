//! Duration utilities

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Split a whole-second duration into `(minutes, seconds)`.
///
/// Holds `minutes * 60 + seconds == total_secs` and `seconds < 60` for every
/// input; used for the `M:SS` track-length labels shown next to candidates.
pub fn split_minutes(total_secs: u32) -> (u32, u32) {
    (total_secs / 60, total_secs % 60)
}

/// Format a whole-second duration as `M:SS`.
pub fn format_track_length(total_secs: u32) -> String {
    let (minutes, seconds) = split_minutes(total_secs);
    format!("{}:{:02}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::from_millis(0));
        assert_eq!(millis_to_duration(1500), Duration::from_millis(1500));
        assert_eq!(millis_to_duration(3_600_000), Duration::from_secs(3600));
    }

    #[test]
    fn test_split_minutes_boundaries() {
        assert_eq!(split_minutes(0), (0, 0));
        assert_eq!(split_minutes(59), (0, 59));
        assert_eq!(split_minutes(60), (1, 0));
        assert_eq!(split_minutes(61), (1, 1));
        assert_eq!(split_minutes(3599), (59, 59));
    }

    #[test]
    fn test_split_minutes_invariant() {
        for total in 0..=7200u32 {
            let (minutes, seconds) = split_minutes(total);
            assert_eq!(minutes * 60 + seconds, total);
            assert!(seconds < 60);
        }
    }

    #[test]
    fn test_format_track_length() {
        assert_eq!(format_track_length(0), "0:00");
        assert_eq!(format_track_length(65), "1:05");
        assert_eq!(format_track_length(204), "3:24");
        assert_eq!(format_track_length(3661), "61:01");
    }
}
