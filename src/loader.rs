//! Upstream data collaborator: reads a tabular file into the in-memory
//! record set the table core operates on.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::DtxError;
use crate::schema::{ColumnDef, Record};

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_type: FileType,
}

/// The materialized dataset handed to the Model: declared columns derived
/// from the file header plus the full record set.
#[derive(Debug)]
pub struct Dataset {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub records: Vec<Record>,
}

/// Load `path` whole. Every column is cast to its string representation,
/// nulls read as empty string.
pub fn load(path: PathBuf) -> Result<Dataset, DtxError> {
    let file_info = get_file_info(path)?;
    let frame = match file_info.file_type {
        FileType::CSV => load_csv(&file_info.path)?,
        FileType::PARQUET => load_parquet(&file_info.path)?,
        FileType::ARROW => load_arrow(&file_info.path)?,
    };

    // Each column is materialized in its own rayon task, the row-major
    // transpose happens afterwards on the calling thread.
    let start_time = Instant::now();
    let df = frame.collect()?;
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    let column_data: Result<Vec<Vec<String>>, PolarsError> = names
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect();
    let column_data = column_data?;

    let nrows = column_data.first().map(|c| c.len()).unwrap_or(0);
    let mut records = Vec::with_capacity(nrows);
    for ridx in 0..nrows {
        let record: Record = names
            .iter()
            .zip(column_data.iter())
            .map(|(name, data)| (name.clone(), data[ridx].clone()))
            .collect();
        records.push(record);
    }

    let columns = names
        .iter()
        .map(|name| ColumnDef::new(name.clone(), name.clone()))
        .collect();

    let duration = start_time.elapsed().as_millis();
    info!("Loading data took {duration}ms ...");
    debug!("Loaded {} records with {} columns", records.len(), names.len());

    let name = file_info
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string();

    Ok(Dataset {
        name,
        columns,
        records,
    })
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<String>, PolarsError> {
    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    let mut data = Vec::with_capacity(series.len());
    for value in series.into_iter() {
        let ss = match value {
            Some(s) => s.replace("\r\n", " ").replace("\n", " "),
            None => String::new(),
        };
        data.push(ss);
    }
    Ok(data)
}

fn detect_file_type(path: &Path) -> Result<FileType, DtxError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(DtxError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, DtxError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DtxError::FileNotFound,
        ErrorKind::PermissionDenied => DtxError::PermissionDenied,
        _ => DtxError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(DtxError::LoadingFailed("Not a file!".into()));
    }

    let file_type = detect_file_type(&path)?;

    Ok(FileInfo { path, file_type })
}

fn load_csv(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.as_path().into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(
        PlPath::Local(path.as_path().into()),
        ScanArgsParquet::default(),
    )
}

fn load_arrow(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.as_path().into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn csv_round_trip() {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(file, "name,age").unwrap();
        writeln!(file, "Ada,36").unwrap();
        writeln!(file, "Grace,85").unwrap();
        file.flush().unwrap();

        let dataset = load(file.path().to_path_buf()).unwrap();
        assert_eq!(dataset.columns.len(), 2);
        assert_eq!(dataset.columns[0].header, "name");
        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.records[0].value("name"), "Ada");
        assert_eq!(dataset.records[1].value("age"), "85");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load(PathBuf::from("data.txt")).unwrap_err();
        assert!(matches!(
            err,
            DtxError::UnknownFileType | DtxError::FileNotFound
        ));
    }
}
