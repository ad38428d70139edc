//! Schema catalog
//!
//! Enumerates the pre-existing tables and their columns, and gates every
//! identifier interpolated into query text. Table and column names go
//! through `require_table`/`require_column` before use; cell values are
//! always bound as parameters.

use crate::error::{Result, StoreError};
use crate::types::ColumnInfo;
use rusqlite::{params, Connection};

/// List the user tables in the store
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Check whether a table exists
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Validate a table name before it is interpolated anywhere
pub fn require_table(conn: &Connection, table: &str) -> Result<()> {
    if table_exists(conn, table)? {
        Ok(())
    } else {
        Err(StoreError::UnknownTable(table.to_owned()))
    }
}

/// List a table's columns with their declared types
pub fn list_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    require_table(conn, table)?;
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map(params![table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                declared_type: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Check whether a column exists on a table
pub fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    Ok(list_columns(conn, table)?.iter().any(|c| c.name == column))
}

/// Validate a column name before it is interpolated anywhere
pub fn require_column(conn: &Connection, table: &str, column: &str) -> Result<()> {
    if has_column(conn, table, column)? {
        Ok(())
    } else {
        Err(StoreError::UnknownColumn {
            table: table.to_owned(),
            column: column.to_owned(),
        })
    }
}

/// Whether a column name marks an aggregable quantity.
///
/// Naming convention only; nothing in the schema records it.
pub fn is_usage_column(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with("_usage")
}

/// The usage columns of a column set, in schema order
pub fn usage_columns(columns: &[ColumnInfo]) -> Vec<String> {
    columns
        .iter()
        .filter(|c| is_usage_column(&c.name))
        .map(|c| c.name.clone())
        .collect()
}

/// The selectable meter columns of a column set: everything that is not a
/// usage aggregate, a key column, or bookkeeping
pub fn meter_columns(columns: &[ColumnInfo]) -> Vec<String> {
    columns
        .iter()
        .filter(|c| {
            let lower = c.name.to_ascii_lowercase();
            !lower.contains("usage") && !matches!(lower.as_str(), "date" | "time" | "modification")
        })
        .map(|c| c.name.clone())
        .collect()
}
