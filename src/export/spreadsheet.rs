//! Spreadsheet backend: one workbook with a single sheet holding every raw
//! field of every filtered record, not only the declared display columns.

use std::path::Path;

use rust_xlsxwriter::Workbook;
use tracing::trace;

use crate::schema::{Record, field_union};

use super::ExportError;

pub fn write(records: &[Record], path: &Path, sheet_name: &str) -> Result<(), ExportError> {
    let (fields, rows) = raw_grid(records);
    trace!(
        "Writing {} records with {} fields to {}",
        rows.len(),
        fields.len(),
        path.display()
    );

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name)?;

    for (cidx, name) in fields.iter().enumerate() {
        sheet.write_string(0, cidx as u16, name)?;
    }
    for (ridx, row) in rows.iter().enumerate() {
        for (cidx, value) in row.iter().enumerate() {
            sheet.write_string((ridx + 1) as u32, cidx as u16, value)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// The exact cell grid the workbook gets: a header row holding every raw
/// field in first-seen order, then one row per record with absent fields
/// as empty cells.
fn raw_grid(records: &[Record]) -> (Vec<String>, Vec<Vec<String>>) {
    let fields = field_union(records);
    let rows = records
        .iter()
        .map(|record| {
            fields
                .iter()
                .map(|name| record.value(name).to_string())
                .collect()
        })
        .collect();
    (fields, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn grid_covers_every_raw_field_with_empty_absent_cells() {
        let records = vec![
            record(&[("name", "Ada"), ("age", "36")]),
            record(&[("name", "Grace"), ("city", "Arlington")]),
        ];

        let (fields, rows) = raw_grid(&records);
        assert_eq!(fields, vec!["name", "age", "city"]);
        assert_eq!(
            rows,
            vec![
                vec!["Ada".to_string(), "36".to_string(), String::new()],
                vec!["Grace".to_string(), String::new(), "Arlington".to_string()],
            ]
        );
    }

    #[test]
    fn writes_a_workbook_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let records = vec![
            record(&[("name", "Ada"), ("age", "36")]),
            record(&[("name", "Grace"), ("city", "Arlington")]),
        ];

        write(&records, &path, "Data").unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.len() > 0);
    }

    #[test]
    fn empty_set_still_produces_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        write(&[], &path, "Data").unwrap();
        assert!(path.exists());
    }
}
