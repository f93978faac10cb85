use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

/// Get the current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// UTC calendar month containing `at_millis`, as `(start, end)` epoch
/// milliseconds. The end bound is exclusive (first instant of the next month).
pub fn month_bounds_millis(at_millis: i64) -> (i64, i64) {
    let at = DateTime::from_timestamp_millis(at_millis).unwrap_or_else(Utc::now);
    let start = NaiveDate::from_ymd_opt(at.year(), at.month(), 1);
    let end = if at.month() == 12 {
        NaiveDate::from_ymd_opt(at.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(at.year(), at.month() + 1, 1)
    };
    match (start, end) {
        (Some(s), Some(e)) => (
            s.and_time(NaiveTime::MIN).and_utc().timestamp_millis(),
            e.and_time(NaiveTime::MIN).and_utc().timestamp_millis(),
        ),
        // Unreachable for dates within chrono's supported range
        _ => (at_millis, at_millis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_month_bounds_mid_month() {
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 0).unwrap();
        let (start, end) = month_bounds_millis(at.timestamp_millis());
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
                .unwrap()
                .timestamp_millis()
        );
        assert_eq!(
            end,
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0)
                .unwrap()
                .timestamp_millis()
        );
    }

    #[test]
    fn test_month_bounds_december_rollover() {
        let at = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let (start, end) = month_bounds_millis(at.timestamp_millis());
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0)
                .unwrap()
                .timestamp_millis()
        );
        assert_eq!(
            end,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
                .unwrap()
                .timestamp_millis()
        );
    }

    #[test]
    fn test_month_bounds_contains_input() {
        let at = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let ms = at.timestamp_millis();
        let (start, end) = month_bounds_millis(ms);
        assert!(start <= ms && ms < end);
    }
}
