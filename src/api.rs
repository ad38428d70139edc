//! Operations surface
//!
//! The [`Database`] facade exposes every operation the display layer
//! consumes as plain function calls: table/column introspection, date
//! spans and key cross-sections, range and point reads, the audited cell
//! update, usage sums, audit-log readback, and spreadsheet export.
//!
//! Each method acquires its own store connection and releases it on every
//! exit path. No state is shared across requests beyond the configured
//! paths.

use crate::audit::AuditLog;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::types::{ColumnInfo, RecordKey, RecordSet, Value};
use crate::update::UpdateOutcome;
use crate::{catalog, export, reader, store, time_index, update};
use chrono::NaiveDate;
use rusqlite::Connection;

/// Handle to one meter-reading store and its update logs
#[derive(Debug)]
pub struct Database {
    config: StoreConfig,
    audit: AuditLog,
}

impl Database {
    /// Open a handle, probing that the store can execute a statement.
    ///
    /// Nothing stays open afterwards; the probe connection is released
    /// before this returns.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let conn = store::connect(&config.db_path)?;
        conn.execute_batch("SELECT 1")?;
        drop(conn);

        let audit = AuditLog::new(config.log_dir.clone());
        Ok(Self { config, audit })
    }

    fn connect(&self) -> Result<Connection> {
        store::connect(&self.config.db_path)
    }

    // ========================================================================
    // Schema catalog
    // ========================================================================

    /// Names of the tables in the store
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        catalog::list_tables(&conn)
    }

    /// Columns of a table with their declared types
    pub fn list_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let conn = self.connect()?;
        catalog::list_columns(&conn, table)
    }

    /// Columns whose names mark them as aggregable usage quantities
    pub fn usage_columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(catalog::usage_columns(&self.list_columns(table)?))
    }

    /// Selectable meter columns (excludes usage, key, and bookkeeping names)
    pub fn meter_columns(&self, table: &str) -> Result<Vec<String>> {
        Ok(catalog::meter_columns(&self.list_columns(table)?))
    }

    // ========================================================================
    // Time index
    // ========================================================================

    /// Span of a table's `Date` column; `(today, today)` when it has no rows
    pub fn date_range(&self, table: &str) -> Result<(NaiveDate, NaiveDate)> {
        let conn = self.connect()?;
        time_index::date_range(&conn, table)
    }

    /// Sorted distinct dates and times seen in a table
    pub fn available_keys(&self, table: &str) -> Result<(Vec<String>, Vec<String>)> {
        let conn = self.connect()?;
        time_index::available_keys(&conn, table)
    }

    // ========================================================================
    // Record reader
    // ========================================================================

    /// Rows with `Date` in `[from, to]`, optionally projected to
    /// `Date`, `Time`, and the requested columns
    pub fn read_range(
        &self,
        table: &str,
        from: NaiveDate,
        to: NaiveDate,
        columns: Option<&[&str]>,
    ) -> Result<RecordSet> {
        let conn = self.connect()?;
        reader::read_range(&conn, table, from, to, columns)
    }

    /// One cell by raw (date, time) key; the key is normalized before lookup
    pub fn read_cell(
        &self,
        table: &str,
        date: &str,
        time: &str,
        column: &str,
    ) -> Result<Vec<Value>> {
        let key = RecordKey::parse(date, time)?;
        let conn = self.connect()?;
        reader::read_cell(&conn, table, &key, column)
    }

    /// One arbitrary row, for schema spot-checks
    pub fn sample_row(&self, table: &str) -> Result<RecordSet> {
        let conn = self.connect()?;
        reader::sample_row(&conn, table)
    }

    /// Sum of one column over a date range (NULL cells skipped)
    pub fn sum_range(
        &self,
        table: &str,
        from: NaiveDate,
        to: NaiveDate,
        column: &str,
    ) -> Result<f64> {
        let conn = self.connect()?;
        reader::sum_range(&conn, table, from, to, column)
    }

    // ========================================================================
    // Update engine
    // ========================================================================

    /// Correct one cell, with verification and audit logging.
    ///
    /// `new_value` of `None` writes NULL; supplied text must be numeric.
    /// A value within `1e-6` of the stored one terminates successfully
    /// without touching the store or the log.
    pub fn update_cell(
        &self,
        table: &str,
        date: &str,
        time: &str,
        column: &str,
        new_value: Option<&str>,
    ) -> Result<UpdateOutcome> {
        let mut conn = self.connect()?;
        update::update_cell(&mut conn, &self.audit, table, date, time, column, new_value)
    }

    // ========================================================================
    // Audit log
    // ========================================================================

    /// Full update-log content for a table; empty if nothing was ever logged
    pub fn read_audit_log(&self, table: &str) -> Result<String> {
        self.audit.read(table)
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// Range read encoded as a one-sheet spreadsheet blob
    pub fn export_range(
        &self,
        table: &str,
        from: NaiveDate,
        to: NaiveDate,
        columns: Option<&[&str]>,
    ) -> Result<Vec<u8>> {
        let set = self.read_range(table, from, to, columns)?;
        export::to_xlsx(&set)
    }
}
