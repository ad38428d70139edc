//! Canonical key types for point addressing
//!
//! A row is addressed by two separately-stored, separately-formatted text
//! fields: `Date` carries a full timestamp at second granularity, `Time`
//! carries the sub-second clock at microsecond precision. They stay two
//! typed fields here; fusing them into one datetime would be lossy.

use crate::error::{Result, StoreError};
use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;

/// Format of the stored `Date` column: `YYYY-MM-DD HH:MM:SS`
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the stored `Time` column: `HH:MM:SS.ffffff`
pub const TIME_KEY_FORMAT: &str = "%H:%M:%S%.6f";

/// A `Date` key in the exact string form the store compares against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CanonicalDate(String);

impl CanonicalDate {
    /// Reparse-and-reformat the raw key into canonical form.
    ///
    /// The stored `Date` field includes both date and time components, so
    /// the input must be a full timestamp, not a calendar date.
    pub fn parse(raw: &str) -> Result<Self> {
        let parsed = NaiveDateTime::parse_from_str(raw, DATE_KEY_FORMAT)
            .map_err(|_| StoreError::MalformedDate(raw.to_owned()))?;
        Ok(Self(parsed.format(DATE_KEY_FORMAT).to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `Time` key in the exact string form the store compares against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CanonicalTime(String);

impl CanonicalTime {
    /// Reparse-and-reformat the raw key into canonical form.
    ///
    /// The stored `Time` field always carries a fractional part, so input
    /// without one is rejected rather than padded.
    pub fn parse(raw: &str) -> Result<Self> {
        if !raw.contains('.') {
            return Err(StoreError::MalformedTime(raw.to_owned()));
        }
        let parsed = NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
            .map_err(|_| StoreError::MalformedTime(raw.to_owned()))?;
        Ok(Self(parsed.format(TIME_KEY_FORMAT).to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The sole addressing key for point reads and updates
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecordKey {
    pub date: CanonicalDate,
    pub time: CanonicalTime,
}

impl RecordKey {
    /// Normalize a raw (date, time) pair into a point-addressing key
    pub fn parse(date: &str, time: &str) -> Result<Self> {
        Ok(Self {
            date: CanonicalDate::parse(date)?,
            time: CanonicalTime::parse(time)?,
        })
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}
