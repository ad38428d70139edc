//! Audit log
//!
//! One append-only text log per table records every applied cell
//! mutation. Entries are never mutated or deleted; append order is the
//! chronological order of changes. The log is written by the update
//! engine and only ever read back for display.

use crate::error::Result;
use crate::types::RecordKey;
use chrono::Local;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Wall-clock stamp format used for `changed_at`
const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One immutable record of a successfully committed cell mutation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditEntry {
    pub table: String,
    pub date: String,
    pub time: String,
    pub column: String,
    /// Stored value before the update, as displayed
    pub old_value: String,
    /// Requested value; `None` records a null write
    pub new_value: Option<f64>,
    /// Wall-clock time of the change (of the write, not of the data)
    pub changed_at: String,
}

impl AuditEntry {
    /// Build an entry for a just-committed mutation, stamped now
    pub fn new(
        table: &str,
        key: &RecordKey,
        column: &str,
        old_value: impl ToString,
        new_value: Option<f64>,
    ) -> Self {
        Self {
            table: table.to_owned(),
            date: key.date.as_str().to_owned(),
            time: key.time.as_str().to_owned(),
            column: column.to_owned(),
            old_value: old_value.to_string(),
            new_value,
            changed_at: Local::now().format(STAMP_FORMAT).to_string(),
        }
    }

    /// Render as one log line
    pub fn to_line(&self) -> String {
        let new_value = match self.new_value {
            Some(v) => v.to_string(),
            None => "NULL".to_owned(),
        };
        format!(
            "{} | {} | {} {} | {} | Old Value: {} | New Value: {}",
            self.changed_at, self.table, self.date, self.time, self.column, self.old_value, new_value,
        )
    }
}

/// Append-only, per-table update logs under one directory
#[derive(Debug, Clone)]
pub struct AuditLog {
    log_dir: PathBuf,
}

impl AuditLog {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    /// Path of a table's log file
    pub fn path_for(&self, table: &str) -> PathBuf {
        self.log_dir.join(format!("{table}_updates.log"))
    }

    /// Append one entry, creating the directory and file on first write.
    ///
    /// Callers surface a failure here as a warning; the data mutation has
    /// already committed and is never rolled back for a logging error.
    pub fn append(&self, entry: &AuditEntry) -> Result<()> {
        fs::create_dir_all(&self.log_dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(&entry.table))?;
        writeln!(file, "{}", entry.to_line())?;
        Ok(())
    }

    /// Full log content for a table; no log yet reads as empty
    pub fn read(&self, table: &str) -> Result<String> {
        let path = self.path_for(table);
        if path.exists() {
            Ok(fs::read_to_string(path)?)
        } else {
            Ok(String::new())
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}
