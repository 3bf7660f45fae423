// Dwell-time helpers for stage duration accounting

pub const SECS_PER_DAY: i64 = 86_400;

/// Round an elapsed time in seconds to whole days, half up.
/// Negative input (clock skew) counts as zero elapsed time.
pub fn round_to_days(elapsed_secs: i64) -> i64 {
    if elapsed_secs <= 0 {
        return 0;
    }
    (elapsed_secs + SECS_PER_DAY / 2) / SECS_PER_DAY
}

/// Format a day count for display ("0d", "12d")
pub fn format_days(days: i64) -> String {
    format!("{}d", days)
}

/// Format the age of a record for the lead table.
/// Days once at least one day has passed, hours or minutes below that.
pub fn format_age(elapsed_secs: i64) -> String {
    if elapsed_secs < 0 {
        return "0m".to_string();
    }
    if elapsed_secs >= SECS_PER_DAY {
        format!("{}d", elapsed_secs / SECS_PER_DAY)
    } else if elapsed_secs >= 3600 {
        format!("{}h", elapsed_secs / 3600)
    } else {
        format!("{}m", elapsed_secs / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_days_half_up() {
        assert_eq!(round_to_days(0), 0);
        assert_eq!(round_to_days(SECS_PER_DAY / 2 - 1), 0);
        assert_eq!(round_to_days(SECS_PER_DAY / 2), 1);
        assert_eq!(round_to_days(SECS_PER_DAY), 1);
        assert_eq!(round_to_days(SECS_PER_DAY + SECS_PER_DAY / 2), 2);
        assert_eq!(round_to_days(3 * SECS_PER_DAY), 3);
    }

    #[test]
    fn test_round_to_days_negative() {
        assert_eq!(round_to_days(-5), 0);
        assert_eq!(round_to_days(-SECS_PER_DAY), 0);
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(30), "0m");
        assert_eq!(format_age(90), "1m");
        assert_eq!(format_age(3 * 3600), "3h");
        assert_eq!(format_age(5 * SECS_PER_DAY), "5d");
        assert_eq!(format_age(-10), "0m");
    }
}
