//! Print backend: the column restricted table as inline markup, written to
//! an ephemeral file and raised on the system's default surface with an
//! immediate print trigger.

use std::io::Write;
use std::path::PathBuf;

use tracing::trace;

use crate::schema::{ColumnDef, Record};

use super::{ExportError, column_table};

pub fn print(records: &[Record], columns: &[ColumnDef]) -> Result<PathBuf, ExportError> {
    let markup = build_markup(records, columns);

    let mut file = tempfile::Builder::new()
        .prefix("dtx-print-")
        .suffix(".html")
        .tempfile()?;
    file.write_all(markup.as_bytes())?;
    // Keep the file alive past this thread, the viewer reads it after we
    // are gone. It lives in the temp dir and is reclaimed by the OS.
    let (_, path) = file.keep().map_err(|e| ExportError::Io(e.error))?;
    trace!("Print surface markup at {}", path.display());

    open::that_detached(&path).map_err(|e| ExportError::PrintSurface(e.to_string()))?;
    Ok(path)
}

fn build_markup(records: &[Record], columns: &[ColumnDef]) -> String {
    let (headers, rows) = column_table(records, columns);

    let header_cells: String = headers
        .iter()
        .map(|h| format!("<th>{}</th>", escape(h)))
        .collect();
    let body_rows: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| format!("<td>{}</td>", escape(cell)))
                .collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();

    format!(
        "<html>\n<head>\n<title>Print Table</title>\n<style>\n\
         table {{ width: 100%; border-collapse: collapse; }}\n\
         th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}\n\
         th {{ background-color: #f4f4f4; }}\n\
         </style>\n</head>\n<body onload=\"window.print()\">\n\
         <h1>Report</h1>\n\
         <table>\n<thead>\n<tr>{header_cells}</tr>\n</thead>\n\
         <tbody>\n{body_rows}\n</tbody>\n</table>\n</body>\n</html>\n"
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Record;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn markup_holds_declared_columns_in_order() {
        let columns = vec![
            ColumnDef::new("name", "Name"),
            ColumnDef::new("age", "Age"),
        ];
        let records = vec![record(&[("age", "36"), ("name", "Ada"), ("extra", "x")])];

        let markup = build_markup(&records, &columns);
        assert!(markup.contains("<tr><th>Name</th><th>Age</th></tr>"));
        assert!(markup.contains("<tr><td>Ada</td><td>36</td></tr>"));
        assert!(!markup.contains("extra"));
    }

    #[test]
    fn missing_fields_become_empty_cells_not_null_text() {
        let columns = vec![ColumnDef::new("missing", "Missing")];
        let records = vec![record(&[("name", "Ada")])];

        let markup = build_markup(&records, &columns);
        assert!(markup.contains("<td></td>"));
        assert!(!markup.to_lowercase().contains("null"));
    }

    #[test]
    fn cell_content_is_escaped() {
        let columns = vec![ColumnDef::new("v", "V")];
        let records = vec![record(&[("v", "<script>&")])];

        let markup = build_markup(&records, &columns);
        assert!(markup.contains("<td>&lt;script&gt;&amp;</td>"));
    }

    #[test]
    fn markup_triggers_printing_on_load() {
        let markup = build_markup(&[], &[]);
        assert!(markup.contains("window.print()"));
    }
}
