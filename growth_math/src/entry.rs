//! Follower count observations

use crate::{MathError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar date format used on the wire and in exports
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One (date, follower count) observation.
///
/// `date` is the natural key of the series. The remote service accepts the
/// count under either `count` or `followers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Day of the observation
    pub date: NaiveDate,
    /// Follower count on that day
    #[serde(alias = "followers")]
    pub count: u64,
}

impl Entry {
    /// Create a new entry
    pub fn new(date: NaiveDate, count: u64) -> Self {
        Self { date, count }
    }

    /// Create an entry from a `YYYY-MM-DD` date string
    pub fn parse(date: &str, count: u64) -> Result<Self> {
        Ok(Self::new(parse_date(date)?, count))
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format(DATE_FORMAT), self.count)
    }
}

/// An entry augmented with its day-over-day change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedEntry {
    pub date: NaiveDate,
    pub count: u64,
    /// `count` minus the count of the chronologically previous entry, zero for the first
    pub delta: i64,
}

impl DerivedEntry {
    /// Project back to the plain observation
    pub fn entry(&self) -> Entry {
        Entry::new(self.date, self.count)
    }
}

impl From<DerivedEntry> for Entry {
    fn from(derived: DerivedEntry) -> Self {
        derived.entry()
    }
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MathError::InvalidInput("date is empty".to_string()));
    }

    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|e| MathError::InvalidInput(format!("invalid date '{}': {}", trimmed, e)))
}
