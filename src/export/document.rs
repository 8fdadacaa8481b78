//! Document backend: a titled, paginated PDF report restricted to the
//! declared display columns.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use tracing::trace;

use crate::schema::{ColumnDef, Record};

use super::{ExportError, column_table};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 14.0;
const TITLE_BASELINE: f32 = PAGE_HEIGHT - 10.0;
const TABLE_TOP: f32 = PAGE_HEIGHT - 20.0;
const BOTTOM_MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 7.0;
const TITLE_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 10.0;
// Rough advance width of 10pt Helvetica in mm, used to budget characters
// per column cell.
const CHAR_WIDTH: f32 = 2.2;

pub fn write(
    records: &[Record],
    columns: &[ColumnDef],
    path: &Path,
    title: &str,
) -> Result<(), ExportError> {
    let (headers, rows) = column_table(records, columns);
    trace!(
        "Writing {} rows over {} columns to {}",
        rows.len(),
        headers.len(),
        path.display()
    );

    let (doc, page1, layer1) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "table");
    let body_font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let head_font = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut layer = doc.get_page(page1).get_layer(layer1);
    layer.use_text(title, TITLE_SIZE, Mm(MARGIN), Mm(TITLE_BASELINE), &head_font);

    let ncols = std::cmp::max(1, headers.len());
    let col_width = (PAGE_WIDTH - 2.0 * MARGIN) / ncols as f32;
    let max_chars = std::cmp::max(3, (col_width / CHAR_WIDTH) as usize);

    let mut y = TABLE_TOP;
    draw_row(&layer, &headers, &head_font, col_width, max_chars, y);
    y -= ROW_HEIGHT;

    for row in &rows {
        if y < BOTTOM_MARGIN {
            let (page, table_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "table");
            layer = doc.get_page(page).get_layer(table_layer);
            y = PAGE_HEIGHT - MARGIN;
            // Repeat the header row on every page.
            draw_row(&layer, &headers, &head_font, col_width, max_chars, y);
            y -= ROW_HEIGHT;
        }
        draw_row(&layer, row, &body_font, col_width, max_chars, y);
        y -= ROW_HEIGHT;
    }

    doc.save(&mut BufWriter::new(File::create(path)?))?;
    Ok(())
}

fn draw_row(
    layer: &PdfLayerReference,
    cells: &[String],
    font: &IndirectFontRef,
    col_width: f32,
    max_chars: usize,
    y: f32,
) {
    for (cidx, cell) in cells.iter().enumerate() {
        let x = MARGIN + cidx as f32 * col_width;
        layer.use_text(fit(cell, max_chars), BODY_SIZE, Mm(x), Mm(y), font);
    }
}

/// Truncate `text` to the cell budget, marking the cut with an ellipsis.
fn fit(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
