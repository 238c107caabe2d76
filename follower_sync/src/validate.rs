//! Form input validation
//!
//! All checks here run before anything is sent to the service. Failures are
//! `TrackerError::Validation` with a message meant for the user.

use crate::error::{Result, TrackerError};
use chrono::NaiveDate;
use growth_math::entry::parse_date;
use growth_math::Entry;

pub const MISSING_DATE: &str = "Please enter a date!";
pub const MISSING_COUNT: &str = "Please enter the followers count!";
pub const NON_POSITIVE_COUNT: &str = "Followers count must be a positive number!";
pub const INVALID_COUNT: &str = "Followers count must be a whole number of zero or more!";

/// Parse a required date field
pub fn require_date(raw: &str) -> Result<NaiveDate> {
    if raw.trim().is_empty() {
        return Err(TrackerError::Validation(MISSING_DATE.to_string()));
    }
    parse_date(raw).map_err(|e| TrackerError::Validation(e.to_string()))
}

fn require_count_text(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::Validation(MISSING_COUNT.to_string()));
    }
    Ok(trimmed)
}

/// Validate the add form: a date and a strictly positive whole count
pub fn new_entry(date: &str, count: &str) -> Result<Entry> {
    let date = require_date(date)?;
    let count = require_count_text(count)?;

    // Negative and fractional input are both "not a positive number" to the user
    let value: i64 = count
        .parse()
        .map_err(|_| TrackerError::Validation(NON_POSITIVE_COUNT.to_string()))?;
    if value <= 0 {
        return Err(TrackerError::Validation(NON_POSITIVE_COUNT.to_string()));
    }

    Ok(Entry::new(date, value as u64))
}

/// Validate an entry built in code rather than typed into the form
pub fn checked_entry(entry: Entry) -> Result<Entry> {
    if entry.count == 0 {
        return Err(TrackerError::Validation(NON_POSITIVE_COUNT.to_string()));
    }
    Ok(entry)
}

/// Validate the edit form: both fields present, count a whole number of zero or more
pub fn replacement_entry(new_date: &str, new_count: &str) -> Result<Entry> {
    let date = require_date(new_date)?;
    let count = require_count_text(new_count)?;
    let value: u64 = count
        .parse()
        .map_err(|_| TrackerError::Validation(INVALID_COUNT.to_string()))?;

    Ok(Entry::new(date, value))
}
