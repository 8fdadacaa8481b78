use std::io::Error;
use std::path::PathBuf;

use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

use crate::export::{ExportFormat, ExportOptions};
use crate::schema::ColumnDef;

/// Runtime configuration assembled from the CLI in main.rs.
#[derive(Debug, Clone)]
pub struct DtxConfig {
    pub path: PathBuf,
    pub columns: Option<Vec<ColumnDef>>,
    pub page_size: usize,
    pub export: ExportOptions,
    pub event_poll_time: u64,
}

/// What the user can ask the table to do. Produced by the controller,
/// consumed by Model::update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Quit,
    FirstPage,
    PrevPage,
    NextPage,
    LastPage,
    CyclePageSize,
    Search,
    GotoPage,
    ClearOrClose,
    Export(ExportFormat),
    Help,
    RawKey(KeyEvent),
}

/// Which prompt the one-line input widget is feeding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    SearchTable,
    GotoPage,
}

#[derive(Debug)]
pub enum DtxError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    BadPageSize(usize),
}

impl std::fmt::Display for DtxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DtxError::IoError(e) => write!(f, "IO error: {e}"),
            DtxError::PolarsError(e) => write!(f, "Data error: {e}"),
            DtxError::LoadingFailed(msg) => write!(f, "Loading failed: {msg}"),
            DtxError::FileNotFound => write!(f, "File not found"),
            DtxError::PermissionDenied => write!(f, "Permission denied"),
            DtxError::UnknownFileType => write!(f, "Unknown file type"),
            DtxError::BadPageSize(size) => {
                write!(f, "Unsupported page size {size}, pick one of 10/20/30/40/50")
            }
        }
    }
}

impl From<Error> for DtxError {
    fn from(err: Error) -> Self {
        DtxError::IoError(err)
    }
}

impl From<PolarsError> for DtxError {
    fn from(err: PolarsError) -> Self {
        DtxError::PolarsError(err)
    }
}

pub const HELP_TEXT: &str = "\
 dtx - data table viewer

 /          search all fields
 :          go to page
 Esc        clear search / close popup
 n, Right   next page
 p, Left    previous page
 g, Home    first page
 G, End     last page
 s          cycle page size (10/20/30/40/50)
 e          export spreadsheet (report.xlsx)
 d          export document (report.pdf)
 o          print
 ?          this help
 q          quit
";
