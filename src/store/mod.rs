//! Store connection handling
//!
//! Every operation acquires its own connection and releases it on every
//! exit path; nothing is pooled or shared across requests. The SQLite
//! file's own locking discipline is relied upon for the single-writer
//! guarantee.

use crate::error::{Result, StoreError};
use rusqlite::Connection;
use std::path::Path;

/// Name of the designated timestamp-granularity key column
pub const DATE_COLUMN: &str = "Date";

/// Name of the designated sub-second key column
pub const TIME_COLUMN: &str = "Time";

/// Open a connection to the store for the lifetime of one operation
pub fn connect(db_path: &Path) -> Result<Connection> {
    Connection::open(db_path).map_err(StoreError::StoreUnavailable)
}

/// Quote an identifier for interpolation into query text.
///
/// Identifiers must already be validated against the schema catalog;
/// quoting here only guards the canonical `Date`/`Time` names and the
/// odd characters a legacy schema may carry. Values are never
/// interpolated, only bound.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
