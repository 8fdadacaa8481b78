use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode};

use crate::domain::{DtxConfig, DtxError, Message};
use crate::export::ExportFormat;
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &DtxConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, DtxError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            // While a prompt is open the input widget consumes every key.
            if model.raw_keyevents() {
                return Ok(Some(Message::RawKey(key)));
            }
            return Ok(self.handle_key(key));
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('/') => Some(Message::Search),
            KeyCode::Char(':') => Some(Message::GotoPage),
            KeyCode::Esc => Some(Message::ClearOrClose),
            KeyCode::Char('n') | KeyCode::Right => Some(Message::NextPage),
            KeyCode::Char('p') | KeyCode::Left => Some(Message::PrevPage),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::FirstPage),
            KeyCode::Char('G') | KeyCode::End => Some(Message::LastPage),
            KeyCode::Char('s') => Some(Message::CyclePageSize),
            KeyCode::Char('e') => Some(Message::Export(ExportFormat::Spreadsheet)),
            KeyCode::Char('d') => Some(Message::Export(ExportFormat::Document)),
            KeyCode::Char('o') => Some(Message::Export(ExportFormat::Print)),
            KeyCode::Char('?') => Some(Message::Help),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
