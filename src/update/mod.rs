//! Update engine
//!
//! Mutates a single cell addressed by its (Date, Time) key, preserving an
//! auditable history. Per request: normalize the key, fetch the current
//! value, short-circuit if the requested value already matches, apply the
//! point update inside a scoped transaction, append an audit entry, and
//! re-read to confirm. Terminal outcomes only; nothing partial is
//! persisted.

use crate::audit::{AuditEntry, AuditLog};
use crate::catalog;
use crate::error::{Result, StoreError};
use crate::reader;
use crate::store::{quote_ident, DATE_COLUMN, TIME_COLUMN};
use crate::types::{RecordKey, Value};
use rusqlite::{params, Connection};
use tracing::{debug, warn};

/// Below this numeric distance a requested value counts as already stored
/// and the update is a no-op.
pub const VALUE_EPSILON: f64 = 1e-6;

/// Terminal outcome of an update request
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Requested value already matches the stored one; neither the store
    /// nor the log was touched.
    Unchanged(Vec<Value>),
    /// Cell rewritten, audit entry appended, and re-read after commit.
    /// Carries the post-update read.
    Applied(Vec<Value>),
}

impl UpdateOutcome {
    /// The observed cell values, whichever way the request terminated
    pub fn values(&self) -> &[Value] {
        match self {
            UpdateOutcome::Unchanged(values) | UpdateOutcome::Applied(values) => values,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied(_))
    }
}

/// Coerce the requested value. `None` means a literal null write; any
/// supplied text must read as a float.
fn parse_new_value(raw: Option<&str>) -> Result<Option<f64>> {
    match raw {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| StoreError::InvalidValue(s.to_owned())),
    }
}

/// Run one update request to a terminal outcome.
///
/// The connection spans the whole request; only the apply step runs in a
/// transaction. The verify re-read is a best-effort confirmation, so a
/// concurrent external writer between commit and verify can make the
/// returned value disagree with what this request wrote.
pub fn update_cell(
    conn: &mut Connection,
    audit: &AuditLog,
    table: &str,
    date: &str,
    time: &str,
    column: &str,
    new_value: Option<&str>,
) -> Result<UpdateOutcome> {
    // Normalize and coerce before any store access.
    let key = RecordKey::parse(date, time)?;
    let requested = parse_new_value(new_value)?;

    catalog::require_table(conn, table)?;
    catalog::require_column(conn, table, column)?;

    // Fetch current.
    let current = reader::read_cell(conn, table, &key, column)?;
    let Some(stored) = current.first().cloned() else {
        return Err(StoreError::NoSuchRecord {
            table: table.to_owned(),
            date: key.date.as_str().to_owned(),
            time: key.time.as_str().to_owned(),
        });
    };

    // Short-circuit: a requested value numerically equal to the stored one
    // leaves both the store and the log untouched.
    if let (Some(requested), Some(stored)) = (requested, stored.as_f64()) {
        if (requested - stored).abs() < VALUE_EPSILON {
            debug!(table, %key, column, "requested value matches stored value, no update");
            return Ok(UpdateOutcome::Unchanged(current));
        }
    }

    apply(conn, table, &key, column, requested)?;

    // The mutation has committed; a log failure must not undo it.
    let entry = AuditEntry::new(table, &key, column, &stored, requested);
    if let Err(err) = audit.append(&entry) {
        warn!(table, %key, column, error = %err, "audit log append failed for committed update");
    }

    // Verify.
    let verified = reader::read_cell(conn, table, &key, column)?;
    debug!(table, %key, column, ?verified, "update applied");
    Ok(UpdateOutcome::Applied(verified))
}

/// Execute the point update inside a scoped transaction. Any failure
/// aborts the transaction and leaves the record unchanged.
fn apply(
    conn: &mut Connection,
    table: &str,
    key: &RecordKey,
    column: &str,
    value: Option<f64>,
) -> Result<()> {
    let sql = format!(
        "UPDATE {table} SET {col} = ?1 WHERE {date} = ?2 AND {time} = ?3",
        table = quote_ident(table),
        col = quote_ident(column),
        date = quote_ident(DATE_COLUMN),
        time = quote_ident(TIME_COLUMN),
    );

    let tx = conn.transaction().map_err(StoreError::UpdateFailed)?;
    tx.execute(&sql, params![value, key.date.as_str(), key.time.as_str()])
        .map_err(StoreError::UpdateFailed)?;
    tx.commit().map_err(StoreError::UpdateFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Connection, AuditLog) {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join("meters.db")).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE electric (
                "Date" TEXT NOT NULL,
                "Time" TEXT NOT NULL,
                meter_1 REAL,
                note TEXT
            );
            INSERT INTO electric VALUES ('2024-01-15 00:00:00', '00:00:00.000000', 10.5, 'ok');
            INSERT INTO electric VALUES ('2024-01-16 00:00:00', '00:00:00.000000', 11.0, 'ok');
            "#,
        )
        .unwrap();
        let audit = AuditLog::new(dir.path().join("update_logs"));
        (dir, conn, audit)
    }

    fn stored_meter_1(conn: &Connection, date: &str) -> Value {
        let key = RecordKey::parse(date, "00:00:00.000000").unwrap();
        reader::read_cell(conn, "electric", &key, "meter_1")
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_update_applied_with_audit() {
        let (_dir, mut conn, audit) = fixture();

        let outcome = update_cell(
            &mut conn,
            &audit,
            "electric",
            "2024-01-15 00:00:00",
            "00:00:00.000000",
            "meter_1",
            Some("42.25"),
        )
        .unwrap();

        assert!(outcome.was_applied());
        assert_eq!(outcome.values(), &[Value::Float(42.25)]);
        assert_eq!(stored_meter_1(&conn, "2024-01-15 00:00:00"), Value::Float(42.25));

        // Exactly one entry, carrying old and new.
        let content = audit.read("electric").unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Old Value: 10.5"));
        assert!(lines[0].contains("New Value: 42.25"));
        assert!(lines[0].contains("meter_1"));
    }

    #[test]
    fn test_update_within_epsilon_is_noop() {
        let (_dir, mut conn, audit) = fixture();

        let outcome = update_cell(
            &mut conn,
            &audit,
            "electric",
            "2024-01-15 00:00:00",
            "00:00:00.000000",
            "meter_1",
            Some("10.5000000001"),
        )
        .unwrap();

        assert!(!outcome.was_applied());
        assert_eq!(outcome.values(), &[Value::Float(10.5)]);
        assert_eq!(stored_meter_1(&conn, "2024-01-15 00:00:00"), Value::Float(10.5));
        assert_eq!(audit.read("electric").unwrap(), "");
    }

    #[test]
    fn test_update_missing_record() {
        let (_dir, mut conn, audit) = fixture();

        let err = update_cell(
            &mut conn,
            &audit,
            "electric",
            "2024-03-01 00:00:00",
            "00:00:00.000000",
            "meter_1",
            Some("1.0"),
        )
        .unwrap_err();

        assert!(matches!(err, StoreError::NoSuchRecord { .. }));
        assert_eq!(audit.read("electric").unwrap(), "");
    }

    #[test]
    fn test_update_malformed_date_fails_fast() {
        let (_dir, mut conn, audit) = fixture();

        // A date that cannot exist is rejected before any query runs.
        let err = update_cell(
            &mut conn,
            &audit,
            "electric",
            "2024-02-30 00:00:00",
            "00:00:00.000000",
            "meter_1",
            Some("1.0"),
        )
        .unwrap_err();

        assert!(matches!(err, StoreError::MalformedDate(_)));
        assert_eq!(audit.read("electric").unwrap(), "");
    }

    #[test]
    fn test_update_invalid_value() {
        let (_dir, mut conn, audit) = fixture();

        let err = update_cell(
            &mut conn,
            &audit,
            "electric",
            "2024-01-15 00:00:00",
            "00:00:00.000000",
            "meter_1",
            Some("abc"),
        )
        .unwrap_err();

        assert!(matches!(err, StoreError::InvalidValue(_)));
        assert_eq!(stored_meter_1(&conn, "2024-01-15 00:00:00"), Value::Float(10.5));
        assert_eq!(audit.read("electric").unwrap(), "");
    }

    #[test]
    fn test_update_null_write() {
        let (_dir, mut conn, audit) = fixture();

        let outcome = update_cell(
            &mut conn,
            &audit,
            "electric",
            "2024-01-16 00:00:00",
            "00:00:00.000000",
            "meter_1",
            None,
        )
        .unwrap();

        assert!(outcome.was_applied());
        assert_eq!(outcome.values(), &[Value::Null]);
        assert!(audit.read("electric").unwrap().contains("New Value: NULL"));
    }

    #[test]
    fn test_update_leaves_other_rows_alone() {
        let (_dir, mut conn, audit) = fixture();

        update_cell(
            &mut conn,
            &audit,
            "electric",
            "2024-01-15 00:00:00",
            "00:00:00.000000",
            "meter_1",
            Some("99.0"),
        )
        .unwrap();

        assert_eq!(stored_meter_1(&conn, "2024-01-16 00:00:00"), Value::Float(11.0));
    }

    #[test]
    fn test_parse_new_value() {
        assert_eq!(parse_new_value(None).unwrap(), None);
        assert_eq!(parse_new_value(Some("42.5")).unwrap(), Some(42.5));
        assert_eq!(parse_new_value(Some(" 7 ")).unwrap(), Some(7.0));
        assert!(matches!(
            parse_new_value(Some("abc")).unwrap_err(),
            StoreError::InvalidValue(_)
        ));
        assert!(matches!(
            parse_new_value(Some("")).unwrap_err(),
            StoreError::InvalidValue(_)
        ));
    }
}
