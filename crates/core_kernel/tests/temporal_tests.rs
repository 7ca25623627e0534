//! Unit tests for the calendar helpers

use chrono::{NaiveDate, TimeZone, Utc};
use core_kernel::{days_between, format_iso_date, parse_iso_date, TemporalError, Timezone};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

mod iso_date_tests {
    use super::*;

    #[test]
    fn test_round_trip_format() {
        let d = date(2024, 3, 9);
        assert_eq!(format_iso_date(d), "2024-03-09");
        assert_eq!(parse_iso_date(&format_iso_date(d)).unwrap(), d);
    }

    #[test]
    fn test_rejects_timestamps_and_garbage() {
        assert!(parse_iso_date("2024-03-09T10:00:00Z").is_err());
        assert!(parse_iso_date("tomorrow").is_err());
        assert_eq!(
            parse_iso_date(""),
            Err(TemporalError::InvalidDate(String::new()))
        );
    }

    #[test]
    fn test_leap_day() {
        assert!(parse_iso_date("2024-02-29").is_ok());
        assert!(parse_iso_date("2023-02-29").is_err());
    }
}

mod day_arithmetic_tests {
    use super::*;

    #[test]
    fn test_across_month_boundary() {
        assert_eq!(days_between(date(2024, 1, 31), date(2024, 2, 1)), 1);
    }

    #[test]
    fn test_across_leap_february() {
        assert_eq!(days_between(date(2024, 2, 28), date(2024, 3, 1)), 2);
        assert_eq!(days_between(date(2023, 2, 28), date(2023, 3, 1)), 1);
    }

    #[test]
    fn test_negative_when_reversed() {
        assert_eq!(days_between(date(2024, 2, 10), date(2024, 2, 1)), -9);
    }
}

mod timezone_tests {
    use super::*;

    #[test]
    fn test_parse_and_name() {
        let tz = Timezone::parse("Asia/Kolkata").unwrap();
        assert_eq!(tz.name(), "Asia/Kolkata");
    }

    #[test]
    fn test_local_date_before_local_midnight() {
        let tz = Timezone::parse("Asia/Kolkata").unwrap();
        let instant = Utc.with_ymd_and_hms(2024, 1, 28, 18, 0, 0).unwrap();
        assert_eq!(tz.local_date(instant), date(2024, 1, 28));
    }

    #[test]
    fn test_serde_uses_iana_name() {
        let tz = Timezone::parse("Europe/London").unwrap();
        let json = serde_json::to_string(&tz).unwrap();
        assert_eq!(json, "\"Europe/London\"");
        let back: Timezone = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tz);
        assert!(serde_json::from_str::<Timezone>("\"Nowhere/Special\"").is_err());
    }
}
