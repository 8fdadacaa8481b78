//! Export subsystem: three format backends over the filtered, unpaginated
//! record set.
//!
//! Each request runs on its own worker thread. The worker gets an `Arc`
//! clone of the record set plus the filtered index view, produces the
//! artifact, and reports back over an mpsc channel drained by the event
//! loop. A per backend busy flag refuses overlapping jobs; different
//! backends may run at the same time.

pub mod document;
pub mod printer;
pub mod spreadsheet;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Instant;

use derive_setters::Setters;
use tracing::{debug, error};

use crate::schema::{ColumnDef, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Spreadsheet,
    Document,
    Print,
}

impl ExportFormat {
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Spreadsheet => "Spreadsheet",
            ExportFormat::Document => "Document",
            ExportFormat::Print => "Print",
        }
    }

    fn index(&self) -> usize {
        match self {
            ExportFormat::Spreadsheet => 0,
            ExportFormat::Document => 1,
            ExportFormat::Print => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JobStatus {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Transient per invocation value, carried in the outcome event and
/// discarded once the status line has been updated.
#[derive(Debug, Clone, Copy)]
pub struct ExportJob {
    pub format: ExportFormat,
    pub status: JobStatus,
}

/// What a finished worker reports back to the event loop.
#[derive(Debug)]
pub struct ExportOutcome {
    pub job: ExportJob,
    pub detail: String,
}

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Workbook(rust_xlsxwriter::XlsxError),
    Document(printpdf::Error),
    PrintSurface(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "IO error: {e}"),
            ExportError::Workbook(e) => write!(f, "Workbook error: {e}"),
            ExportError::Document(e) => write!(f, "Document error: {e}"),
            ExportError::PrintSurface(msg) => write!(f, "Print surface unavailable: {msg}"),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Workbook(err)
    }
}

impl From<printpdf::Error> for ExportError {
    fn from(err: printpdf::Error) -> Self {
        ExportError::Document(err)
    }
}

/// Artifact naming and labelling, overridable from the CLI.
#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_", into)]
pub struct ExportOptions {
    pub out_dir: PathBuf,
    pub spreadsheet_file: String,
    pub document_file: String,
    pub document_title: String,
    pub sheet_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            out_dir: PathBuf::from("."),
            spreadsheet_file: "report.xlsx".to_string(),
            document_file: "report.pdf".to_string(),
            document_title: "Data Table Report".to_string(),
            sheet_name: "Data".to_string(),
        }
    }
}

impl ExportOptions {
    fn spreadsheet_path(&self) -> PathBuf {
        self.out_dir.join(&self.spreadsheet_file)
    }

    fn document_path(&self) -> PathBuf {
        self.out_dir.join(&self.document_file)
    }
}

/// The column restricted table shared by the document and print backends:
/// header labels in declared order, one cell per declared column, absent
/// fields as empty string.
pub fn column_table(records: &[Record], columns: &[ColumnDef]) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = columns.iter().map(|c| c.header.clone()).collect();
    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| record.value(&c.key).to_string())
                .collect()
        })
        .collect();
    (headers, rows)
}

pub struct Exporter {
    options: ExportOptions,
    tx: Sender<ExportOutcome>,
    busy: [bool; 3],
}

impl Exporter {
    pub fn new(options: ExportOptions, tx: Sender<ExportOutcome>) -> Self {
        Exporter {
            options,
            tx,
            busy: [false; 3],
        }
    }

    pub fn is_busy(&self, format: ExportFormat) -> bool {
        self.busy[format.index()]
    }

    pub fn job_status(&self, format: ExportFormat) -> JobStatus {
        if self.is_busy(format) {
            JobStatus::Running
        } else {
            JobStatus::Idle
        }
    }

    pub fn busy_labels(&self) -> Vec<&'static str> {
        [
            ExportFormat::Spreadsheet,
            ExportFormat::Document,
            ExportFormat::Print,
        ]
        .iter()
        .filter(|f| self.is_busy(**f))
        .map(|f| f.label())
        .collect()
    }

    /// Spawn a worker for `format` over the filtered view. Returns false
    /// without spawning when that backend already has a job in flight.
    pub fn request(
        &mut self,
        format: ExportFormat,
        records: Arc<Vec<Record>>,
        view: Vec<usize>,
        columns: Vec<ColumnDef>,
    ) -> bool {
        if self.is_busy(format) {
            return false;
        }
        self.busy[format.index()] = true;

        let tx = self.tx.clone();
        let options = self.options.clone();
        thread::spawn(move || {
            let start_time = Instant::now();
            let filtered: Vec<Record> = view.iter().map(|&idx| records[idx].clone()).collect();
            let result = run(format, &filtered, &columns, &options);

            // The outcome is sent on success and failure alike, it is the
            // only thing that releases the busy flag.
            let outcome = match result {
                Ok(path) => {
                    debug!(
                        "{} export of {} records took {}ms",
                        format.label(),
                        filtered.len(),
                        start_time.elapsed().as_millis()
                    );
                    ExportOutcome {
                        job: ExportJob {
                            format,
                            status: JobStatus::Succeeded,
                        },
                        detail: path.display().to_string(),
                    }
                }
                Err(e) => {
                    error!("{} export failed: {e}", format.label());
                    ExportOutcome {
                        job: ExportJob {
                            format,
                            status: JobStatus::Failed,
                        },
                        detail: e.to_string(),
                    }
                }
            };
            let _ = tx.send(outcome);
        });
        true
    }

    /// Release the busy flag once the outcome event has been drained.
    pub fn finish(&mut self, format: ExportFormat) {
        self.busy[format.index()] = false;
    }
}

fn run(
    format: ExportFormat,
    filtered: &[Record],
    columns: &[ColumnDef],
    options: &ExportOptions,
) -> Result<PathBuf, ExportError> {
    match format {
        ExportFormat::Spreadsheet => {
            let path = options.spreadsheet_path();
            spreadsheet::write(filtered, &path, &options.sheet_name)?;
            Ok(path)
        }
        ExportFormat::Document => {
            let path = options.document_path();
            document::write(filtered, columns, &path, &options.document_title)?;
            Ok(path)
        }
        ExportFormat::Print => printer::print(filtered, columns),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn column_table_restricts_to_declared_columns() {
        let records = vec![
            record(&[("name", "Ada"), ("age", "36"), ("secret", "x")]),
            record(&[("name", "Grace")]),
        ];
        let columns = vec![
            ColumnDef::new("name", "Name"),
            ColumnDef::new("age", "Age"),
        ];

        let (headers, rows) = column_table(&records, &columns);
        assert_eq!(headers, vec!["Name", "Age"]);
        assert_eq!(rows, vec![vec!["Ada", "36"], vec!["Grace", ""]]);
    }

    #[test]
    fn overlapping_jobs_on_one_backend_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let options = ExportOptions::default().with_out_dir(dir.path().to_path_buf());
        let mut exporter = Exporter::new(options, tx);

        let records = Arc::new(vec![record(&[("name", "Ada")])]);
        let columns = vec![ColumnDef::new("name", "Name")];

        assert!(exporter.request(
            ExportFormat::Spreadsheet,
            Arc::clone(&records),
            vec![0],
            columns.clone(),
        ));
        // Second call while the first has not been drained yet.
        assert!(!exporter.request(
            ExportFormat::Spreadsheet,
            Arc::clone(&records),
            vec![0],
            columns.clone(),
        ));
        // A different backend is independent.
        assert!(!exporter.is_busy(ExportFormat::Document));
        assert_eq!(
            exporter.job_status(ExportFormat::Spreadsheet),
            JobStatus::Running
        );
        assert_eq!(exporter.job_status(ExportFormat::Document), JobStatus::Idle);

        let outcome = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.job.format, ExportFormat::Spreadsheet);
        assert_eq!(outcome.job.status, JobStatus::Succeeded);

        exporter.finish(outcome.job.format);
        assert!(exporter.request(
            ExportFormat::Spreadsheet,
            Arc::clone(&records),
            vec![0],
            columns,
        ));
        let _ = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    }
}
