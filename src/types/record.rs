//! Cell values and read results

use rusqlite::types::ValueRef;
use serde::Serialize;
use std::fmt;

/// Unified cell value covering SQLite's storage classes
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum Value {
    /// Null value
    Null,

    /// Integer value
    Integer(i64),

    /// Floating point value
    Float(f64),

    /// Text string
    Text(String),

    /// Raw bytes
    Blob(Vec<u8>),
}

impl Value {
    /// Convert a borrowed SQLite value into an owned cell value
    pub(crate) fn from_sql(raw: ValueRef<'_>) -> Self {
        match raw {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Float(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }

    /// Coerce to a float for numeric comparison.
    ///
    /// Measurement cells may be stored as REAL, INTEGER, or numeric TEXT;
    /// anything else has no numeric reading.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "blob({} bytes)", b.len()),
        }
    }
}

/// Column name and declared type, as reported by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Declared SQL type (may be empty for untyped columns)
    pub declared_type: String,
}

/// One row of a read result, aligned with the owning set's column order
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Record {
    pub values: Vec<Value>,
}

/// An ordered read result: column names plus the rows that matched
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordSet {
    /// Projection order; range reads always lead with `Date`, `Time`
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl RecordSet {
    /// Position of a column in the projection, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Look up one cell of one record by column name
    pub fn get<'a>(&self, record: &'a Record, column: &str) -> Option<&'a Value> {
        self.column_index(column)
            .and_then(|idx| record.values.get(idx))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
