use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Instant;

use tracing::{info, trace, warn};

use crate::domain::{DtxConfig, DtxError, HELP_TEXT, InputMode, Message};
use crate::export::{ExportFormat, ExportOutcome, Exporter, JobStatus};
use crate::filter;
use crate::inputter::{InputResult, Inputter};
use crate::loader::Dataset;
use crate::pager::{PaginationState, paginate};
use crate::schema::{ColumnDef, Record};

#[derive(Debug, PartialEq)]
pub enum Status {
    LOADING,
    READY,
    QUITTING,
}

/// Total display state of the table body. Exactly one of these holds at
/// any time, rendering never falls through a chain of boolean checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayState {
    LOADING,
    EMPTY,
    POPULATED,
}

/// One visible row: its 1-based sequential number (continuous across
/// pages) and the declared column cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub number: usize,
    pub cells: Vec<String>,
}

/// Snapshot of everything the UI needs for one frame.
#[derive(Clone)]
pub struct UiData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RowView>,
    pub display: DisplayState,
    pub page_index: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total_records: usize,
    pub filtered_records: usize,
    pub query: String,
    pub exporting: Vec<&'static str>,
    pub show_popup: bool,
    pub popup_message: String,
    pub cmdinput: InputResult,
    pub input_mode: Option<InputMode>,
    pub active_cmdinput: bool,
    pub status_message: String,
    pub last_status_message_update: Instant,
}

impl UiData {
    fn empty() -> Self {
        UiData {
            name: String::new(),
            headers: Vec::new(),
            rows: Vec::new(),
            display: DisplayState::LOADING,
            page_index: 0,
            page_count: 1,
            page_size: 10,
            total_records: 0,
            filtered_records: 0,
            query: String::new(),
            exporting: Vec::new(),
            show_popup: false,
            popup_message: String::new(),
            cmdinput: InputResult::default(),
            input_mode: None,
            active_cmdinput: false,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        }
    }
}

pub struct Model {
    pub status: Status,
    name: String,
    columns: Vec<ColumnDef>,
    configured_columns: Option<Vec<ColumnDef>>,
    records: Arc<Vec<Record>>,
    view: Vec<usize>, // Indices of the filtered records, in original order
    query: String,
    pager: PaginationState,
    exporter: Exporter,
    input: Inputter,
    input_mode: Option<InputMode>,
    last_input: InputResult,
    active_cmdinput: bool,
    show_popup: bool,
    popup_message: String,
    status_message: String,
    last_status_message_update: Instant,
    uidata: UiData,
}

impl Model {
    pub fn init(config: &DtxConfig, export_tx: Sender<ExportOutcome>) -> Self {
        let mut pager = PaginationState::default();
        pager.set_page_size(config.page_size);

        let mut model = Self {
            status: Status::LOADING,
            name: String::new(),
            columns: config.columns.clone().unwrap_or_default(),
            configured_columns: config.columns.clone(),
            records: Arc::new(Vec::new()),
            view: Vec::new(),
            query: String::new(),
            pager,
            exporter: Exporter::new(config.export.clone(), export_tx),
            input: Inputter::default(),
            input_mode: None,
            last_input: InputResult::default(),
            active_cmdinput: false,
            show_popup: false,
            popup_message: String::new(),
            status_message: "Loading ...".to_string(),
            last_status_message_update: Instant::now(),
            uidata: UiData::empty(),
        };
        model.update_uidata();
        model
    }

    pub fn get_uidata(&self) -> &UiData {
        &self.uidata
    }

    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    /// A fresh record set fully replaces the previous one. Filter and
    /// pagination are session state and survive, except that the page
    /// index is re-validated against the new filtered length.
    pub fn apply_loaded(&mut self, result: Result<Dataset, DtxError>) {
        match result {
            Ok(dataset) => {
                info!(
                    "Loaded {} records from {}",
                    dataset.records.len(),
                    dataset.name
                );
                self.name = dataset.name;
                self.columns = self.configured_columns.clone().unwrap_or(dataset.columns);
                self.records = Arc::new(dataset.records);
                self.status = Status::READY;
                self.set_status_message(format!("Loaded {} records", self.records.len()));
                self.refresh_view();
            }
            Err(e) => {
                warn!("Loading failed: {e}");
                self.records = Arc::new(Vec::new());
                self.status = Status::READY;
                self.set_status_message(format!("{e}"));
                self.refresh_view();
            }
        }
    }

    /// Drain a finished export job: release the backend's busy flag and
    /// surface the result, on success and failure alike.
    pub fn apply_export(&mut self, outcome: ExportOutcome) {
        self.exporter.finish(outcome.job.format);
        let label = outcome.job.format.label();
        match outcome.job.status {
            JobStatus::Succeeded => {
                self.set_status_message(format!("{label} export done: {}", outcome.detail));
            }
            _ => {
                self.set_status_message(format!("{label} export failed: {}", outcome.detail));
            }
        }
        self.update_uidata();
    }

    pub fn update(&mut self, message: Message) {
        trace!("Update: {:?}", message);
        match message {
            Message::Quit => self.quit(),
            Message::FirstPage => {
                self.pager.first(self.view.len());
                self.update_uidata();
            }
            Message::PrevPage => {
                self.pager.prev(self.view.len());
                self.update_uidata();
            }
            Message::NextPage => {
                self.pager.next(self.view.len());
                self.update_uidata();
            }
            Message::LastPage => {
                self.pager.last(self.view.len());
                self.update_uidata();
            }
            Message::CyclePageSize => {
                self.pager.cycle_page_size();
                self.set_status_message(format!("Rows per page: {}", self.pager.page_size));
                self.update_uidata();
            }
            Message::Search => self.enter_input_mode(InputMode::SearchTable),
            Message::GotoPage => self.enter_input_mode(InputMode::GotoPage),
            Message::ClearOrClose => self.clear_or_close(),
            Message::Export(format) => self.request_export(format),
            Message::Help => self.show_help(),
            Message::RawKey(key) => self.raw_input(key),
        }
    }

    pub fn display_state(&self) -> DisplayState {
        if self.status == Status::LOADING {
            DisplayState::LOADING
        } else if self.view.is_empty() {
            DisplayState::EMPTY
        } else {
            DisplayState::POPULATED
        }
    }

    // -------------------- Control handling functions ---------------------- //

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    fn refresh_view(&mut self) {
        self.view = filter::filter(&self.records, &self.query);
        self.pager.clamp_to(self.view.len());
        self.update_uidata();
    }

    fn clear_or_close(&mut self) {
        if self.show_popup {
            self.show_popup = false;
            self.popup_message.clear();
            self.update_uidata();
        } else if !self.query.is_empty() {
            self.query.clear();
            self.set_status_message("Search cleared");
            self.refresh_view();
        }
    }

    fn show_help(&mut self) {
        self.show_popup = true;
        self.popup_message = HELP_TEXT.to_string();
        self.update_uidata();
    }

    fn enter_input_mode(&mut self, mode: InputMode) {
        trace!("Entering input mode {:?} ...", mode);
        self.input_mode = Some(mode);
        self.active_cmdinput = true;
        self.input.clear();
        self.last_input = self.input.get();
        self.update_uidata();
    }

    fn raw_input(&mut self, key: ratatui::crossterm::event::KeyEvent) {
        if self.active_cmdinput {
            self.last_input = self.input.read(key);
            if self.last_input.finished {
                self.handle_cmd_input();
            }
            self.update_uidata();
        }
    }

    fn handle_cmd_input(&mut self) {
        self.active_cmdinput = false;
        let cmd_input = self.last_input.input.clone();
        let canceled = self.last_input.canceled;
        let mode = self.input_mode.take();

        if canceled {
            self.update_uidata();
            return;
        }
        match mode {
            Some(InputMode::SearchTable) => self.apply_search(&cmd_input),
            Some(InputMode::GotoPage) => self.apply_goto(&cmd_input),
            None => {}
        }
    }

    fn apply_search(&mut self, query: &str) {
        self.query = query.to_string();
        self.refresh_view();
        if self.query.is_empty() {
            self.set_status_message("Search cleared");
        } else {
            self.set_status_message(format!(
                "Found {} of {} records",
                self.view.len(),
                self.records.len()
            ));
        }
        self.update_uidata();
    }

    fn apply_goto(&mut self, input: &str) {
        match input.trim().parse::<usize>() {
            Ok(page) if page >= 1 => {
                self.pager.go_to(page - 1, self.view.len());
            }
            _ => {
                self.set_status_message(format!("Not a page number: \"{input}\""));
            }
        }
        self.update_uidata();
    }

    /// Exports run over the filtered, unpaginated view. A backend with a
    /// job in flight refuses re-entry until its outcome is drained.
    fn request_export(&mut self, format: ExportFormat) {
        if self.status == Status::LOADING {
            self.set_status_message("Still loading ...");
            self.update_uidata();
            return;
        }
        if self.view.is_empty() {
            self.set_status_message("Nothing to export");
            self.update_uidata();
            return;
        }

        let accepted = self.exporter.request(
            format,
            Arc::clone(&self.records),
            self.view.clone(),
            self.columns.clone(),
        );
        if accepted {
            self.set_status_message(format!("{} export started ...", format.label()));
        } else {
            self.set_status_message(format!("{} export already running", format.label()));
        }
        self.update_uidata();
    }

    fn visible_page(&self) -> Vec<RowView> {
        let (page, _) = paginate(&self.view, self.pager.page_index, self.pager.page_size);
        page.iter()
            .enumerate()
            .map(|(local_idx, &ridx)| {
                let record = &self.records[ridx];
                RowView {
                    number: self.pager.page_index * self.pager.page_size + local_idx + 1,
                    cells: self
                        .columns
                        .iter()
                        .map(|c| record.value(&c.key).to_string())
                        .collect(),
                }
            })
            .collect()
    }

    fn update_uidata(&mut self) {
        let (_, page_count) = paginate(&self.view, self.pager.page_index, self.pager.page_size);
        self.uidata = UiData {
            name: self.name.clone(),
            headers: self.columns.iter().map(|c| c.header.clone()).collect(),
            rows: self.visible_page(),
            display: self.display_state(),
            page_index: self.pager.page_index,
            page_count,
            page_size: self.pager.page_size,
            total_records: self.records.len(),
            filtered_records: self.view.len(),
            query: self.query.clone(),
            exporting: self.exporter.busy_labels(),
            show_popup: self.show_popup,
            popup_message: self.popup_message.clone(),
            cmdinput: self.last_input.clone(),
            input_mode: self.input_mode,
            active_cmdinput: self.active_cmdinput,
            status_message: self.status_message.clone(),
            last_status_message_update: self.last_status_message_update,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportOptions;
    use std::path::PathBuf;
    use std::sync::mpsc;

    fn record(idx: usize) -> Record {
        vec![
            ("name".to_string(), format!("person {idx}")),
            ("rank".to_string(), idx.to_string()),
        ]
        .into_iter()
        .collect()
    }

    fn dataset(nrecords: usize) -> Dataset {
        Dataset {
            name: "test.csv".to_string(),
            columns: vec![
                ColumnDef::new("name", "Name"),
                ColumnDef::new("rank", "Rank"),
            ],
            records: (0..nrecords).map(record).collect(),
        }
    }

    fn model(out_dir: PathBuf) -> (Model, mpsc::Receiver<ExportOutcome>) {
        let config = DtxConfig {
            path: PathBuf::from("test.csv"),
            columns: None,
            page_size: 10,
            export: ExportOptions::default().with_out_dir(out_dir),
            event_poll_time: 100,
        };
        let (tx, rx) = mpsc::channel();
        (Model::init(&config, tx), rx)
    }

    fn ready_model(nrecords: usize) -> Model {
        let (mut m, _rx) = model(PathBuf::from("."));
        m.apply_loaded(Ok(dataset(nrecords)));
        m
    }

    #[test]
    fn starts_in_loading_state() {
        let (m, _rx) = model(PathBuf::from("."));
        assert_eq!(m.status, Status::LOADING);
        assert_eq!(m.display_state(), DisplayState::LOADING);
    }

    #[test]
    fn declared_columns_head_the_loading_skeleton() {
        let config = DtxConfig {
            path: PathBuf::from("test.csv"),
            columns: Some(vec![
                ColumnDef::new("name", "Name"),
                ColumnDef::new("rank", "Rank"),
            ]),
            page_size: 10,
            export: ExportOptions::default(),
            event_poll_time: 100,
        };
        let (tx, _rx) = mpsc::channel();
        let m = Model::init(&config, tx);

        assert_eq!(m.display_state(), DisplayState::LOADING);
        assert_eq!(m.get_uidata().headers, vec!["Name", "Rank"]);
    }

    #[test]
    fn empty_record_set_is_a_first_class_empty_state() {
        let m = ready_model(0);
        assert_eq!(m.display_state(), DisplayState::EMPTY);
        assert_eq!(m.get_uidata().page_count, 1);
        assert!(m.get_uidata().rows.is_empty());
    }

    #[test]
    fn row_numbering_is_continuous_across_pages() {
        let mut m = ready_model(25);
        let ui = m.get_uidata();
        assert_eq!(ui.page_count, 3);
        assert_eq!(ui.rows.len(), 10);
        assert_eq!(ui.rows[0].number, 1);
        assert_eq!(ui.rows[9].number, 10);

        m.update(Message::LastPage);
        let ui = m.get_uidata();
        assert_eq!(ui.page_index, 2);
        assert_eq!(ui.rows.len(), 5);
        assert_eq!(ui.rows[0].number, 21);
        assert_eq!(ui.rows[4].number, 25);
    }

    #[test]
    fn navigation_is_a_noop_at_the_boundaries() {
        let mut m = ready_model(25);
        m.update(Message::PrevPage);
        assert_eq!(m.get_uidata().page_index, 0);

        m.update(Message::LastPage);
        m.update(Message::NextPage);
        assert_eq!(m.get_uidata().page_index, 2);

        m.update(Message::FirstPage);
        assert_eq!(m.get_uidata().page_index, 0);
    }

    #[test]
    fn cycling_page_size_resets_the_page_index() {
        let mut m = ready_model(25);
        m.update(Message::LastPage);
        m.update(Message::CyclePageSize);
        let ui = m.get_uidata();
        assert_eq!(ui.page_size, 20);
        assert_eq!(ui.page_index, 0);
    }

    #[test]
    fn search_filters_case_insensitive_and_reclamps_the_page() {
        let mut m = ready_model(25);
        m.update(Message::LastPage);
        m.apply_search("PERSON 7");
        let ui = m.get_uidata();
        assert_eq!(ui.filtered_records, 1);
        assert_eq!(ui.page_index, 0);
        assert_eq!(ui.rows[0].cells[0], "person 7");
        // Pre-filter total stays visible
        assert_eq!(ui.total_records, 25);
    }

    #[test]
    fn clearing_the_search_restores_the_full_view() {
        let mut m = ready_model(25);
        m.apply_search("person 7");
        m.update(Message::ClearOrClose);
        assert_eq!(m.get_uidata().filtered_records, 25);
    }

    #[test]
    fn goto_page_is_one_based_and_clamped() {
        let mut m = ready_model(25);
        m.apply_goto("2");
        assert_eq!(m.get_uidata().page_index, 1);
        m.apply_goto("99");
        assert_eq!(m.get_uidata().page_index, 2);
        m.apply_goto("nope");
        assert_eq!(m.get_uidata().page_index, 2);
    }

    #[test]
    fn empty_filtered_set_refuses_exports() {
        let mut m = ready_model(0);
        m.update(Message::Export(ExportFormat::Spreadsheet));
        assert_eq!(m.get_uidata().status_message, "Nothing to export");
    }

    #[test]
    fn overlapping_export_on_one_backend_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let (mut m, rx) = model(dir.path().to_path_buf());
        m.apply_loaded(Ok(dataset(5)));

        m.update(Message::Export(ExportFormat::Spreadsheet));
        assert!(m.get_uidata().status_message.contains("started"));
        m.update(Message::Export(ExportFormat::Spreadsheet));
        assert!(
            m.get_uidata()
                .status_message
                .contains("already running")
        );

        let outcome = rx.recv_timeout(std::time::Duration::from_secs(10)).unwrap();
        m.apply_export(outcome);
        assert!(m.get_uidata().status_message.contains("export done"));
        assert!(m.get_uidata().exporting.is_empty());
    }

    #[test]
    fn load_failure_degrades_to_a_status_message() {
        let (mut m, _rx) = model(PathBuf::from("."));
        m.apply_loaded(Err(DtxError::FileNotFound));
        assert_eq!(m.status, Status::READY);
        assert_eq!(m.display_state(), DisplayState::EMPTY);
        assert!(m.get_uidata().status_message.contains("File not found"));
    }
}
