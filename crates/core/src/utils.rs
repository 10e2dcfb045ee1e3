//! Time helpers

use chrono::{DateTime, NaiveDate};

/// Number of seconds in a day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Convert whole days into seconds
pub fn days(n: i64) -> i64 {
    n * SECONDS_PER_DAY
}

/// UTC calendar day containing a unix timestamp
pub fn utc_day(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_day_boundaries() {
        let midnight = 1_700_006_400; // 2023-11-15T00:00:00Z
        assert_eq!(utc_day(midnight), utc_day(midnight + SECONDS_PER_DAY - 1));
        assert_ne!(utc_day(midnight), utc_day(midnight - 1));
        assert_eq!(days(7), 604_800);
    }
}
