use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Error types for timezone operations
#[derive(Debug, Error)]
pub enum TimezoneError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// Parse a timezone string
pub fn parse_timezone(tz_str: &str) -> Result<Tz, TimezoneError> {
    tz_str
        .trim()
        .parse()
        .map_err(|_| TimezoneError::InvalidTimezone(tz_str.to_string()))
}

/// The calendar date of `now` as seen from `timezone`
pub fn local_date(now: DateTime<Utc>, timezone: &Tz) -> NaiveDate {
    now.with_timezone(timezone).date_naive()
}
