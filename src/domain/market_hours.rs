//! Regular trading session check (weekdays, 09:00–15:30 inclusive, local time).

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};

pub const MARKET_OPEN: (u32, u32) = (9, 0);
pub const MARKET_CLOSE: (u32, u32) = (15, 30);

pub fn is_market_open(now: NaiveDateTime) -> bool {
    if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }

    let (Some(open), Some(close)) = (
        NaiveTime::from_hms_opt(MARKET_OPEN.0, MARKET_OPEN.1, 0),
        NaiveTime::from_hms_opt(MARKET_CLOSE.0, MARKET_CLOSE.1, 0),
    ) else {
        return false;
    };

    let time = now.time();
    open <= time && time <= close
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn weekday_session() {
        // 2024-01-15 is a Monday
        assert!(is_market_open(at(2024, 1, 15, 10, 30, 0)));
        // Friday
        assert!(is_market_open(at(2024, 1, 19, 14, 0, 0)));
    }

    #[test]
    fn boundaries_inclusive() {
        assert!(is_market_open(at(2024, 1, 15, 9, 0, 0)));
        assert!(is_market_open(at(2024, 1, 15, 15, 30, 0)));
    }

    #[test]
    fn outside_session() {
        assert!(!is_market_open(at(2024, 1, 15, 8, 59, 59)));
        assert!(!is_market_open(at(2024, 1, 15, 15, 30, 1)));
        assert!(!is_market_open(at(2024, 1, 15, 20, 0, 0)));
    }

    #[test]
    fn weekend_closed() {
        // Saturday and Sunday mid-session
        assert!(!is_market_open(at(2024, 1, 13, 10, 0, 0)));
        assert!(!is_market_open(at(2024, 1, 14, 10, 0, 0)));
    }
}
