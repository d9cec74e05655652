use crate::basic::var::WEEK_SECONDS;
use chrono::{Datelike, Timelike, Utc};

/// Normalize a time-of-week value to seconds.
///
/// Observation timestamps arrive as milliseconds of the GPS week while
/// ephemeris reference times are seconds of the week; anything beyond one
/// week of seconds can only be milliseconds.
pub fn norm_tow(t: f64) -> f64 {
    if t > WEEK_SECONDS {
        t / 1000.0
    } else {
        t
    }
}

/// GPS week + time of week to continuous seconds since the GPS epoch.
pub fn week_tow_to_sec(week: i32, tow: f64) -> f64 {
    week as f64 * WEEK_SECONDS + tow
}

/// UTC timestamp for output file headers.
pub fn timestr_utc() -> String {
    let now = Utc::now();
    format!(
        "{:04}{:02}{:02} {:02}{:02}{:02} UTC",
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_tow() {
        // seconds of week pass through
        assert_eq!(norm_tow(159348.0), 159348.0);
        assert_eq!(norm_tow(604800.0), 604800.0);
        // milliseconds are scaled down
        assert_eq!(norm_tow(159348000.0), 159348.0);
        assert_eq!(norm_tow(604801.0), 604.801);
    }

    #[test]
    fn test_week_tow_to_sec() {
        assert_eq!(week_tow_to_sec(0, 10.0), 10.0);
        assert_eq!(week_tow_to_sec(2300, 0.0), 2300.0 * 604800.0);
    }
}
