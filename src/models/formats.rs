//! Date and time formats accepted from forms, JSON imports and CSV files.

use chrono::{NaiveDate, NaiveTime};

use crate::error::AppError;

/// `YYYY-MM-DD`, as sent by `<input type="date">` and CSV files.
pub fn parse_iso_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| AppError::bad_request(format!("invalid date {raw:?}: {err}")))
}

/// `MM/DD/YYYY`, used by the bulk JSON import.
pub fn parse_us_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%m/%d/%Y")
        .map_err(|err| AppError::bad_request(format!("invalid date {raw:?}: {err}")))
}

/// 24-hour `HH:MM`, with optional seconds.
pub fn parse_clock_time(raw: &str) -> Result<NaiveTime, AppError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|err| AppError::bad_request(format!("invalid time {raw:?}: {err}")))
}

/// 12-hour `H:MM AM/PM`, used by the bulk JSON import.
pub fn parse_meridiem_time(raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(raw.trim(), "%I:%M %p")
        .map_err(|err| AppError::bad_request(format!("invalid time {raw:?}: {err}")))
}
