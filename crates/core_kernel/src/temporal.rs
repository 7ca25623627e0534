//! Calendar helpers for due dates and reminder runs
//!
//! Due dates and reminder run days are plain calendar dates (`NaiveDate`).
//! The only place a timezone matters is deciding what "today" is when the
//! scheduler fires, which is resolved through [`Timezone`].

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

/// ISO 8601 calendar date format used for due dates and run days
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// Timezone wrapper for institute-local calendars
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Parses an IANA timezone name such as `Asia/Kolkata`
    pub fn parse(name: &str) -> Result<Self, TemporalError> {
        Tz::from_str(name.trim())
            .map(Timezone)
            .map_err(|_| TemporalError::UnknownTimezone(name.to_string()))
    }

    /// Returns the IANA name
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Converts a UTC instant to the local calendar date
    pub fn local_date(&self, utc: DateTime<Utc>) -> NaiveDate {
        utc.with_timezone(&self.0).date_naive()
    }

    /// Today's date in this timezone
    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timezone::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Parses a strict ISO calendar date (`YYYY-MM-DD`)
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, TemporalError> {
    NaiveDate::parse_from_str(raw.trim(), ISO_DATE_FORMAT)
        .map_err(|_| TemporalError::InvalidDate(raw.to_string()))
}

/// Formats a date as `YYYY-MM-DD`
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Signed number of whole days from `from` to `to`
///
/// Positive when `to` is later than `from`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_iso_date("2024-01-29").unwrap(), date(2024, 1, 29));
        assert_eq!(parse_iso_date(" 2024-02-01 ").unwrap(), date(2024, 2, 1));
        assert!(matches!(
            parse_iso_date("29/01/2024"),
            Err(TemporalError::InvalidDate(_))
        ));
        assert!(parse_iso_date("2024-02-30").is_err());
    }

    #[test]
    fn test_days_between_is_signed() {
        assert_eq!(days_between(date(2024, 1, 29), date(2024, 2, 1)), 3);
        assert_eq!(days_between(date(2024, 2, 1), date(2024, 2, 1)), 0);
        assert_eq!(days_between(date(2024, 2, 7), date(2024, 2, 1)), -6);
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let tz = Timezone::parse("Asia/Kolkata").unwrap();
        // 20:00 UTC is already the next day in IST (+05:30)
        let instant = Utc.with_ymd_and_hms(2024, 1, 28, 20, 0, 0).unwrap();
        assert_eq!(tz.local_date(instant), date(2024, 1, 29));
        assert_eq!(Timezone::default().local_date(instant), date(2024, 1, 28));
    }

    #[test]
    fn test_unknown_timezone() {
        assert!(matches!(
            Timezone::parse("Mars/Olympus"),
            Err(TemporalError::UnknownTimezone(_))
        ));
    }
}
