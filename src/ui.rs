use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Stylize,
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table},
};

use crate::domain::InputMode;
use crate::model::{DisplayState, UiData};

pub const TABLE_HEADER_HEIGHT: u16 = 1;
pub const STATUS_MESSAGE_FADE: std::time::Duration = std::time::Duration::from_secs(8);
pub const SKELETON_ROWS: usize = 10;
pub const SKELETON_CELL: &str = "▒▒▒▒▒▒▒▒";
pub const INDEX_HEADER: &str = "#";

pub struct TableUi;

impl TableUi {
    pub fn new() -> Self {
        TableUi
    }

    pub fn draw(&self, ui: &UiData, frame: &mut Frame) {
        let [query_area, table_area, pager_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(TABLE_HEADER_HEIGHT + 1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.draw_query_line(ui, query_area, frame);
        self.draw_table(ui, table_area, frame);
        self.draw_pager_line(ui, pager_area, frame);
        self.draw_status_line(ui, status_area, frame);

        if ui.show_popup {
            self.draw_popup(ui, frame);
        }
    }

    fn draw_query_line(&self, ui: &UiData, area: Rect, frame: &mut Frame) {
        let line = if ui.active_cmdinput {
            let prompt = match ui.input_mode {
                Some(InputMode::GotoPage) => "Go to page: ",
                _ => "Search: ",
            };
            let input = &ui.cmdinput.input;
            let split = input
                .char_indices()
                .nth(ui.cmdinput.curser_pos)
                .map(|(byte_idx, _)| byte_idx)
                .unwrap_or(input.len());
            Line::from(vec![
                Span::from(prompt).bold(),
                Span::from(input[..split].to_string()),
                Span::from("█"),
                Span::from(input[split..].to_string()),
            ])
        } else if ui.query.is_empty() {
            Line::from(Span::from(" / to search, ? for help").dim())
        } else {
            Line::from(vec![
                Span::from("Search: ").bold(),
                Span::from(ui.query.clone()),
                Span::from(format!(
                    "  ({} of {} records)",
                    ui.filtered_records, ui.total_records
                ))
                .dim(),
            ])
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_table(&self, ui: &UiData, area: Rect, frame: &mut Frame) {
        let ncols = ui.headers.len();

        let mut header_cells = Vec::with_capacity(ncols + 1);
        header_cells.push(Cell::from(INDEX_HEADER).bold());
        for h in &ui.headers {
            header_cells.push(Cell::from(h.clone()).bold());
        }
        let header = Row::new(header_cells).reversed();

        // The body is a total function over the display state: skeleton
        // placeholders, a no-results row, or the visible page.
        let rows: Vec<Row> = match ui.display {
            DisplayState::LOADING => (0..SKELETON_ROWS)
                .map(|_| {
                    Row::new(
                        (0..ncols.max(1) + 1)
                            .map(|_| Cell::from(SKELETON_CELL).dim())
                            .collect::<Vec<Cell>>(),
                    )
                })
                .collect(),
            DisplayState::EMPTY => {
                vec![Row::new(vec![
                    Cell::from(""),
                    Cell::from("No results.".italic()),
                ])]
            }
            DisplayState::POPULATED => ui
                .rows
                .iter()
                .map(|row| {
                    let mut cells = Vec::with_capacity(ncols + 1);
                    cells.push(Cell::from(row.number.to_string()).bold());
                    for cell in &row.cells {
                        cells.push(Cell::from(cell.clone()));
                    }
                    Row::new(cells)
                })
                .collect(),
        };

        let index_width = ui
            .rows
            .last()
            .map(|row| row.number.to_string().len() as u16)
            .unwrap_or(3);
        let mut widths = Vec::with_capacity(ncols + 1);
        widths.push(Constraint::Length(index_width + 1));
        for _ in 0..ncols.max(1) {
            widths.push(Constraint::Fill(1));
        }

        let title = if ui.name.is_empty() {
            " dtx ".to_string()
        } else {
            format!(" {} ", ui.name)
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::bordered().title(Line::from(title.bold()).centered()));
        frame.render_widget(table, area);
    }

    fn draw_pager_line(&self, ui: &UiData, area: Rect, frame: &mut Frame) {
        let line = Line::from(vec![
            Span::from(format!("Rows per page {}", ui.page_size)),
            Span::from("  |  ").dim(),
            Span::from(format!("Page {} of {}", ui.page_index + 1, ui.page_count)).bold(),
            Span::from(format!("  (Total Records {})", ui.total_records)).dim(),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_status_line(&self, ui: &UiData, area: Rect, frame: &mut Frame) {
        // Old messages fade instead of lingering at full intensity.
        let message = Span::from(ui.status_message.clone());
        let message = if ui.last_status_message_update.elapsed() > STATUS_MESSAGE_FADE {
            message.dim()
        } else {
            message
        };
        let mut spans = vec![message];
        if !ui.exporting.is_empty() {
            spans.push(Span::from(format!("  [exporting: {}]", ui.exporting.join(", "))).dim());
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_popup(&self, ui: &UiData, frame: &mut Frame) {
        let area = popup_area(frame.area(), 50, 80);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(ui.popup_message.clone())
                .block(Block::bordered().title(Line::from(" Help ".bold()).centered())),
            area,
        );
    }
}

impl Default for TableUi {
    fn default() -> Self {
        TableUi::new()
    }
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(ratatui::layout::Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(ratatui::layout::Flex::Center)
        .areas(area);
    area
}
