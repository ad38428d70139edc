//! Time index
//!
//! Resolves what keys a table actually holds: the span of its `Date`
//! column and the distinct (date, time) values seen. Feeds valid keys to
//! the record reader (range mode) and the update engine (point mode).

use crate::catalog;
use crate::error::{Result, StoreError};
use crate::store::{quote_ident, DATE_COLUMN, TIME_COLUMN};
use crate::types::DATE_KEY_FORMAT;
use chrono::{Local, NaiveDate, NaiveDateTime};
use rusqlite::Connection;

/// Resolve the date span of a table's rows.
///
/// An empty table yields `(today, today)` as a "no data" sentinel, not a
/// real range.
pub fn date_range(conn: &Connection, table: &str) -> Result<(NaiveDate, NaiveDate)> {
    catalog::require_table(conn, table)?;

    let sql = format!(
        "SELECT MIN({date}), MAX({date}) FROM {table}",
        date = quote_ident(DATE_COLUMN),
        table = quote_ident(table),
    );
    let (min, max): (Option<String>, Option<String>) =
        conn.query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))?;

    match (min, max) {
        (Some(min), Some(max)) => Ok((parse_stored_date(&min)?, parse_stored_date(&max)?)),
        _ => {
            let today = Local::now().date_naive();
            Ok((today, today))
        }
    }
}

/// The distinct dates and distinct times seen in a table, each sorted.
///
/// This is a cross-section, not the set of valid pairs; not every (date,
/// time) combination from the two sequences exists as a row. A missing
/// `Date` or `Time` column yields an empty sequence for that side.
pub fn available_keys(conn: &Connection, table: &str) -> Result<(Vec<String>, Vec<String>)> {
    catalog::require_table(conn, table)?;

    let dates = if catalog::has_column(conn, table, DATE_COLUMN)? {
        distinct_values(conn, table, DATE_COLUMN)?
    } else {
        Vec::new()
    };
    let times = if catalog::has_column(conn, table, TIME_COLUMN)? {
        distinct_values(conn, table, TIME_COLUMN)?
    } else {
        Vec::new()
    };

    Ok((dates, times))
}

fn distinct_values(conn: &Connection, table: &str, column: &str) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT {col} FROM {table} WHERE {col} IS NOT NULL ORDER BY {col}",
        col = quote_ident(column),
        table = quote_ident(table),
    );
    let mut stmt = conn.prepare(&sql)?;
    let values = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(values)
}

/// Stored `Date` values are full timestamps; tolerate bare calendar dates
/// left behind by older ingests.
fn parse_stored_date(raw: &str) -> Result<NaiveDate> {
    NaiveDateTime::parse_from_str(raw, DATE_KEY_FORMAT)
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|_| StoreError::MalformedDate(raw.to_owned()))
}
