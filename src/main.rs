use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Mutex, mpsc};
use std::thread;

mod controller;
mod domain;
mod export;
mod filter;
mod inputter;
mod loader;
mod model;
mod pager;
mod schema;
mod ui;

use clap::Parser;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use controller::Controller;
use domain::{DtxConfig, DtxError};
use export::ExportOptions;
use model::{Model, Status};
use pager::PAGE_SIZE_OPTIONS;
use schema::ColumnDef;
use ui::TableUi;

#[derive(Parser, Debug)]
#[command(name = "dtx", version, about = "View a tabular data file and export it")]
struct Cli {
    /// Tabular data file (csv, parquet, arrow/ipc)
    path: String,

    /// Display columns as comma separated key[:Header] pairs.
    /// Defaults to every column of the file.
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Initial rows per page (10, 20, 30, 40 or 50)
    #[arg(long, default_value_t = 10)]
    page_size: usize,

    /// Directory export artifacts are written to
    #[arg(long, default_value = ".")]
    out_dir: String,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

// The terminal owns stdout, so logs go to a file. Verbosity is driven by
// RUST_LOG.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let Ok(logfile) = std::fs::File::create("dtx.log") else {
        return;
    };
    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(logfile))
                .with_filter(filter),
        )
        .init();
}

fn build_config(cli: Cli) -> Result<DtxConfig, DtxError> {
    if !PAGE_SIZE_OPTIONS.contains(&cli.page_size) {
        return Err(DtxError::BadPageSize(cli.page_size));
    }

    let path = shellexpand::full(&cli.path)
        .map_err(|e| DtxError::LoadingFailed(e.to_string()))?
        .into_owned();
    let out_dir = shellexpand::full(&cli.out_dir)
        .map_err(|e| DtxError::LoadingFailed(e.to_string()))?
        .into_owned();

    let columns = cli
        .columns
        .map(|specs| specs.iter().map(|s| ColumnDef::parse(s)).collect());

    Ok(DtxConfig {
        path: PathBuf::from(path),
        columns,
        page_size: cli.page_size,
        export: ExportOptions::default().with_out_dir(PathBuf::from(out_dir)),
        event_poll_time: 100,
    })
}

fn run() -> Result<(), DtxError> {
    let cli = Cli::parse();
    init_logging();
    let config = build_config(cli)?;
    info!("Starting dtx on {:?}", config.path);

    let (load_tx, load_rx) = mpsc::channel();
    let (export_tx, export_rx) = mpsc::channel();

    let mut model = Model::init(&config, export_tx);

    // The record set arrives whole from a worker thread while the UI
    // shows the loading skeleton.
    let data_path = config.path.clone();
    thread::spawn(move || {
        let _ = load_tx.send(loader::load(data_path));
    });

    let ui = TableUi::new();
    let controller = Controller::new(&config);
    let mut terminal = ratatui::init();

    while model.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(model.get_uidata(), f))?;

        if let Some(message) = controller.handle_event(&model)? {
            model.update(message);
        }
        while let Ok(result) = load_rx.try_recv() {
            model.apply_loaded(result);
        }
        while let Ok(outcome) = export_rx.try_recv() {
            model.apply_export(outcome);
        }
    }

    Ok(())
}
