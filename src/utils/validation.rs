use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];
const MIN_PHONE_DIGITS: usize = 10;

/// Longest free text a MySQL `TEXT` column holds at four bytes per character.
pub const TEXT_MAX: usize = 16_383;

/// A single rejected request field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("Missing required field: {0}")]
    Missing(&'static str),

    #[error("Invalid {0} format. Use YYYY-MM-DD")]
    InvalidDate(&'static str),

    #[error("Invalid {0} format. Use HH:MM:SS or HH:MM")]
    InvalidTime(&'static str),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("{0} cannot be in the future")]
    FutureDate(&'static str),

    #[error("Invalid status '{0}'. Use one of: Present, Absent, Half Day, Leave")]
    InvalidStatus(String),

    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),

    #[error("Phone number must be at least 10 digits")]
    InvalidPhone,
}

/// Trimmed value of a required field; absent or blank is `Missing`.
pub fn required(field: &'static str, value: Option<String>) -> Result<String, FieldError> {
    optional(value).ok_or(FieldError::Missing(field))
}

/// Trimmed value of an optional field; blank counts as absent.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Column width check, counted in characters.
pub fn max_len(field: &'static str, value: String, max: usize) -> Result<String, FieldError> {
    if value.chars().count() > max {
        Err(FieldError::TooLong(field, max))
    } else {
        Ok(value)
    }
}

/// Spaces, dashes and brackets are ignored; at least ten digits are required.
pub fn validate_phone(value: &str) -> Result<(), FieldError> {
    if value.chars().filter(char::is_ascii_digit).count() < MIN_PHONE_DIGITS {
        return Err(FieldError::InvalidPhone);
    }
    Ok(())
}

pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| FieldError::InvalidDate(field))
}

pub fn parse_optional_date(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<NaiveDate>, FieldError> {
    optional(value).map(|v| parse_date(field, &v)).transpose()
}

/// Accepts `HH:MM:SS` first, then `HH:MM`.
pub fn parse_time(field: &'static str, value: &str) -> Result<NaiveTime, FieldError> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
        .ok_or(FieldError::InvalidTime(field))
}

pub fn parse_optional_time(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<NaiveTime>, FieldError> {
    optional(value).map(|v| parse_time(field, &v)).transpose()
}

/// Shape check only: `local@domain.tld`, no whitespace.
pub fn validate_email(value: &str) -> Result<(), FieldError> {
    let invalid = || FieldError::InvalidEmail(value.to_string());

    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub fn not_in_future(
    field: &'static str,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, FieldError> {
    if date > today {
        Err(FieldError::FutureDate(field))
    } else {
        Ok(date)
    }
}
