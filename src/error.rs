//! Error types for the meterdb operations surface

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] rusqlite::Error),

    #[error("table not found: {0}")]
    UnknownTable(String),

    #[error("column '{column}' not found in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("date format not recognized: {0}")]
    MalformedDate(String),

    #[error("time format not recognized: {0}")]
    MalformedTime(String),

    #[error("no record in '{table}' at {date} {time}")]
    NoSuchRecord {
        table: String,
        date: String,
        time: String,
    },

    #[error("new value is not numeric: {0:?}")]
    InvalidValue(String),

    #[error("update failed: {0}")]
    UpdateFailed(#[source] rusqlite::Error),

    #[error("query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export error: {0}")]
    Export(String),
}
