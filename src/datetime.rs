//! UTC datetimes with ISO-8601 parsing and formatting.
//!
//! A [`Datetime`] is a UTC instant at millisecond precision. Input text may be
//! RFC 3339 (`2020-01-02T03:04:05.678+02:00`), a date and time without an
//! offset (read as UTC), or a bare date (`2020-01-02`). Output always uses the
//! full `YYYY-MM-DDTHH:MM:SS.mmmZ` form, with a sign on years outside
//! 0000-9999 so that every value parses back.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Offset-free layouts tried after RFC 3339, all read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// A point in time, stored as a UTC instant truncated to milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Datetime {
    inner: DateTime<Utc>,
}

/// Errors produced when a datetime cannot be built.
#[derive(Debug, Clone, PartialEq)]
pub enum DatetimeError {
    /// The text is not an ISO-8601 date or datetime
    Format(String),
    /// Milliseconds since the epoch outside the representable range
    OutOfRange(i64),
}

impl fmt::Display for DatetimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatetimeError::Format(text) => {
                write!(f, "\"{}\" is not an ISO-8601 date or datetime", text)
            }
            DatetimeError::OutOfRange(millis) => {
                write!(f, "{} ms since the epoch is out of range", millis)
            }
        }
    }
}

impl std::error::Error for DatetimeError {}

impl Datetime {
    pub fn from_millis(millis: i64) -> Result<Self, DatetimeError> {
        DateTime::from_timestamp_millis(millis)
            .map(|inner| Datetime { inner })
            .ok_or(DatetimeError::OutOfRange(millis))
    }

    pub fn millis(&self) -> i64 {
        self.inner.timestamp_millis()
    }

    /// Parse ISO-8601 text.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidyblocks::Datetime;
    ///
    /// let dt = Datetime::parse("1970-01-02").unwrap();
    /// assert_eq!(dt.millis(), 86_400_000);
    /// assert_eq!(dt.to_string(), "1970-01-02T00:00:00.000Z");
    /// ```
    pub fn parse(text: &str) -> Result<Self, DatetimeError> {
        let trimmed = text.trim();

        let parsed = DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NAIVE_FORMATS
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                    .map(|naive| naive.and_utc())
            })
            .or_else(|| {
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            })
            .ok_or_else(|| DatetimeError::Format(text.to_string()))?;

        // Sub-millisecond digits are dropped so equality matches persistence.
        Self::from_millis(parsed.timestamp_millis())
    }
}

impl FromStr for Datetime {
    type Err = DatetimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Datetime::parse(s)
    }
}

impl fmt::Display for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}
