//! Record reader
//!
//! Filtered, optionally column-projected reads over a date range or an
//! exact (Date, Time) key. All identifiers are validated against the
//! schema catalog before interpolation; all values are bound as
//! parameters.

use crate::catalog;
use crate::error::{Result, StoreError};
use crate::store::{quote_ident, DATE_COLUMN, TIME_COLUMN};
use crate::types::{Record, RecordKey, RecordSet, Value};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Statement, ToSql};
use tracing::debug;

/// Read rows whose `Date` falls within `[from, to]`, both ends inclusive.
///
/// With `columns` given, the projection is exactly `Date`, `Time`, then
/// the requested columns in order; otherwise all columns. No matching
/// rows is an empty set, not an error.
pub fn read_range(
    conn: &Connection,
    table: &str,
    from: NaiveDate,
    to: NaiveDate,
    columns: Option<&[&str]>,
) -> Result<RecordSet> {
    catalog::require_table(conn, table)?;

    let projection = match columns {
        None => "*".to_owned(),
        Some(requested) => {
            let mut parts = vec![quote_ident(DATE_COLUMN), quote_ident(TIME_COLUMN)];
            for column in requested {
                // The key columns lead the projection already.
                if *column == DATE_COLUMN || *column == TIME_COLUMN {
                    continue;
                }
                catalog::require_column(conn, table, column)?;
                parts.push(quote_ident(column));
            }
            parts.join(", ")
        }
    };

    // The Date column stores full timestamps, so the inclusive upper bound
    // becomes an exclusive bound on the following day; canonical
    // `YYYY-MM-DD` prefixes make text ordering agree with date ordering.
    let (lower, upper) = range_bounds(from, to)?;

    let sql = format!(
        "SELECT {projection} FROM {table} \
         WHERE {date} >= ?1 AND {date} < ?2 \
         ORDER BY {date}, {time}",
        table = quote_ident(table),
        date = quote_ident(DATE_COLUMN),
        time = quote_ident(TIME_COLUMN),
    );
    let mut stmt = conn.prepare(&sql)?;
    let set = fetch_all(&mut stmt, &[&lower, &upper])?;

    debug!(table, %from, %to, rows = set.len(), "range read");
    Ok(set)
}

/// Read one cell by its normalized (Date, Time) key.
///
/// Returns a sequence defensively; the store invariant says at most one
/// row matches. Comparison is exact string equality after normalization.
pub fn read_cell(
    conn: &Connection,
    table: &str,
    key: &RecordKey,
    column: &str,
) -> Result<Vec<Value>> {
    catalog::require_table(conn, table)?;
    catalog::require_column(conn, table, column)?;

    let sql = format!(
        "SELECT {col} FROM {table} WHERE {date} = ?1 AND {time} = ?2",
        col = quote_ident(column),
        table = quote_ident(table),
        date = quote_ident(DATE_COLUMN),
        time = quote_ident(TIME_COLUMN),
    );
    let mut stmt = conn.prepare(&sql)?;
    let values = stmt
        .query_map(params![key.date.as_str(), key.time.as_str()], |row| {
            Ok(Value::from_sql(row.get_ref(0)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(table, %key, column, matches = values.len(), "cell read");
    Ok(values)
}

/// Fetch one arbitrary row of a table, for schema spot-checks
pub fn sample_row(conn: &Connection, table: &str) -> Result<RecordSet> {
    catalog::require_table(conn, table)?;

    let sql = format!("SELECT * FROM {table} LIMIT 1", table = quote_ident(table));
    let mut stmt = conn.prepare(&sql)?;
    fetch_all(&mut stmt, &[])
}

/// Sum one column over a date range.
///
/// NULL cells are skipped; an empty window sums to zero. Meant for usage
/// columns but accepts any existing column.
pub fn sum_range(
    conn: &Connection,
    table: &str,
    from: NaiveDate,
    to: NaiveDate,
    column: &str,
) -> Result<f64> {
    catalog::require_table(conn, table)?;
    catalog::require_column(conn, table, column)?;

    let (lower, upper) = range_bounds(from, to)?;
    let sql = format!(
        "SELECT TOTAL({col}) FROM {table} WHERE {date} >= ?1 AND {date} < ?2",
        col = quote_ident(column),
        table = quote_ident(table),
        date = quote_ident(DATE_COLUMN),
    );
    let total = conn.query_row(&sql, params![lower, upper], |row| row.get(0))?;
    Ok(total)
}

fn range_bounds(from: NaiveDate, to: NaiveDate) -> Result<(String, String)> {
    let upper = to
        .succ_opt()
        .ok_or_else(|| StoreError::MalformedDate(to.to_string()))?;
    Ok((
        from.format("%Y-%m-%d").to_string(),
        upper.format("%Y-%m-%d").to_string(),
    ))
}

fn fetch_all(stmt: &mut Statement<'_>, bindings: &[&dyn ToSql]) -> Result<RecordSet> {
    let columns: Vec<String> = stmt.column_names().iter().map(|c| (*c).to_owned()).collect();

    let mut rows = stmt.query(bindings)?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            values.push(Value::from_sql(row.get_ref(idx)?));
        }
        records.push(Record { values });
    }

    Ok(RecordSet { columns, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn fixture() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE electric (
                "Date" TEXT NOT NULL,
                "Time" TEXT NOT NULL,
                meter_1 REAL,
                meter_2 REAL,
                electric_usage REAL
            );
            "#,
        )
        .unwrap();

        // One reading per day across January 2024.
        let mut stmt = conn
            .prepare("INSERT INTO electric VALUES (?1, ?2, ?3, ?4, ?5)")
            .unwrap();
        for day in 1..=31 {
            stmt.execute(params![
                format!("2024-01-{day:02} 00:00:00"),
                "00:00:00.000000",
                day as f64,
                day as f64 * 2.0,
                day as f64 * 3.0,
            ])
            .unwrap();
        }
        drop(stmt);
        conn
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_read_range_window() {
        let conn = fixture();
        let set = read_range(&conn, "electric", day(10), day(20), None).unwrap();

        // Exactly the 11 days, each within the window.
        assert_eq!(set.len(), 11);
        let date_idx = set.column_index("Date").unwrap();
        for record in &set.records {
            let date = match &record.values[date_idx] {
                Value::Text(s) => s.clone(),
                other => panic!("unexpected Date value {other:?}"),
            };
            assert!(date.as_str() >= "2024-01-10" && date.as_str() < "2024-01-21");
        }
    }

    #[test]
    fn test_read_range_includes_both_ends() {
        let conn = fixture();
        let set = read_range(&conn, "electric", day(31), day(31), None).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get(&set.records[0], "Date"),
            Some(&Value::Text("2024-01-31 00:00:00".into()))
        );
    }

    #[test]
    fn test_read_range_projection_order() {
        let conn = fixture();
        let set = read_range(&conn, "electric", day(1), day(2), Some(&["meter_2"])).unwrap();
        assert_eq!(set.columns, vec!["Date", "Time", "meter_2"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_read_range_all_columns() {
        let conn = fixture();
        let set = read_range(&conn, "electric", day(1), day(1), None).unwrap();
        assert_eq!(
            set.columns,
            vec!["Date", "Time", "meter_1", "meter_2", "electric_usage"]
        );
    }

    #[test]
    fn test_read_range_empty_window() {
        let conn = fixture();
        let from = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let set = read_range(&conn, "electric", from, to, None).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_read_range_unknown_column() {
        let conn = fixture();
        let err = read_range(&conn, "electric", day(1), day(2), Some(&["meter_9"])).unwrap_err();
        assert!(matches!(err, StoreError::UnknownColumn { .. }));
    }

    #[test]
    fn test_read_cell() {
        let conn = fixture();
        let key = RecordKey::parse("2024-01-15 00:00:00", "00:00:00.000000").unwrap();
        let values = read_cell(&conn, "electric", &key, "meter_1").unwrap();
        assert_eq!(values, vec![Value::Float(15.0)]);
    }

    #[test]
    fn test_read_cell_no_match() {
        let conn = fixture();
        let key = RecordKey::parse("2024-06-15 00:00:00", "00:00:00.000000").unwrap();
        let values = read_cell(&conn, "electric", &key, "meter_1").unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_read_cell_idempotent() {
        let conn = fixture();
        let key = RecordKey::parse("2024-01-15 00:00:00", "00:00:00.000000").unwrap();
        let first = read_cell(&conn, "electric", &key, "meter_1").unwrap();
        let second = read_cell(&conn, "electric", &key, "meter_1").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sample_row() {
        let conn = fixture();
        let set = sample_row(&conn, "electric").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.columns.len(), 5);

        conn.execute_batch(r#"CREATE TABLE bare ("Date" TEXT, "Time" TEXT)"#)
            .unwrap();
        let empty = sample_row(&conn, "bare").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_sum_range() {
        let conn = fixture();
        // Days 10..=20 of meter_1 hold 10.0..=20.0.
        let total = sum_range(&conn, "electric", day(10), day(20), "meter_1").unwrap();
        assert!((total - 165.0).abs() < f64::EPSILON);

        let from = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let empty = sum_range(&conn, "electric", from, from, "meter_1").unwrap();
        assert_eq!(empty, 0.0);
    }
}
