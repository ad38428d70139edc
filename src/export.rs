//! Spreadsheet export
//!
//! A pure, stateless transform from a read result to a one-sheet XLSX
//! byte blob: header row of column names, one row per record, no index
//! column. Consumed by the display layer; nothing here touches the store.

use crate::error::{Result, StoreError};
use crate::types::{RecordSet, Value};
use rust_xlsxwriter::Workbook;

/// Encode a read result as a single-sheet workbook
pub fn to_xlsx(set: &RecordSet) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in set.columns.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, name.as_str())
            .map_err(export_err)?;
    }

    for (idx, record) in set.records.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, value) in record.values.iter().enumerate() {
            let col = col as u16;
            match value {
                Value::Null => {}
                Value::Integer(v) => {
                    worksheet
                        .write_number(row, col, *v as f64)
                        .map_err(export_err)?;
                }
                Value::Float(v) => {
                    worksheet.write_number(row, col, *v).map_err(export_err)?;
                }
                Value::Text(v) => {
                    worksheet
                        .write_string(row, col, v.as_str())
                        .map_err(export_err)?;
                }
                Value::Blob(v) => {
                    worksheet
                        .write_string(row, col, format!("blob({} bytes)", v.len()))
                        .map_err(export_err)?;
                }
            }
        }
    }

    workbook.save_to_buffer().map_err(export_err)
}

fn export_err(err: rust_xlsxwriter::XlsxError) -> StoreError {
    StoreError::Export(err.to_string())
}
