//! Data types for meter-reading tables

mod key;
mod record;

pub use key::{CanonicalDate, CanonicalTime, RecordKey, DATE_KEY_FORMAT, TIME_KEY_FORMAT};
pub use record::{ColumnInfo, Record, RecordSet, Value};
