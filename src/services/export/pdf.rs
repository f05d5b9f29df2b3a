use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use super::{table, ExportError};
use crate::models::Todo;

pub const DOCUMENT_TITLE: &str = "Todo List Export";

// A4, millimetres.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;

const TITLE_FONT_SIZE: f32 = 16.0;
const TITLE_SPACING: f32 = 12.0;
const FONT_SIZE: f32 = 9.0;
const LINE_HEIGHT: f32 = 4.5;
const ROW_SPACING: f32 = 2.0;
const MAX_CELL_LINES: usize = 30;

/// Left edge (mm) and wrap width (characters) per column, in `HEADERS` order.
const COLUMNS: [(f32, usize); 4] = [(15.0, 26), (62.0, 34), (124.0, 20), (162.0, 20)];

type RowLines = [Vec<String>; 4];

/// Build `todos.pdf`: title block, then a four-column table that continues onto new
/// pages (header repeated) as rows run past the bottom margin.
pub fn export_pdf(todos: &[Todo]) -> Result<Vec<u8>, ExportError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(DOCUMENT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = PAGE_HEIGHT - MARGIN;
    layer.use_text(DOCUMENT_TITLE, TITLE_FONT_SIZE, Mm(MARGIN), Mm(y), &bold);
    y -= TITLE_SPACING;

    let rows = table(todos);
    let header = wrap_row(&rows[0]);
    y = write_row(&layer, &header, y, &bold);

    let mut page_count = 1;
    for cells in &rows[1..] {
        let lines = wrap_row(cells);
        if y - row_height(&lines) < MARGIN {
            page_count += 1;
            let (page, page_layer) = doc.add_page(
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
                format!("Page {}", page_count),
            );
            layer = doc.get_page(page).get_layer(page_layer);
            y = write_row(&layer, &header, PAGE_HEIGHT - MARGIN, &bold);
        }
        y = write_row(&layer, &lines, y, &regular);
    }

    let bytes = doc.save_to_bytes().map_err(pdf_error)?;
    tracing::debug!(
        "PDF export: {} todos, {} pages, {} bytes",
        todos.len(),
        page_count,
        bytes.len()
    );
    Ok(bytes)
}

fn pdf_error<E: std::fmt::Debug>(e: E) -> ExportError {
    ExportError::Pdf(format!("{:?}", e))
}

fn wrap_row(cells: &[String; 4]) -> RowLines {
    let mut lines: RowLines = Default::default();
    for (slot, (cell, (_, width))) in lines.iter_mut().zip(cells.iter().zip(COLUMNS.iter())) {
        *slot = wrap(cell, *width);
    }
    lines
}

fn row_height(lines: &RowLines) -> f32 {
    let tallest = lines.iter().map(Vec::len).max().unwrap_or(1).max(1);
    tallest as f32 * LINE_HEIGHT + ROW_SPACING
}

/// Writes one table row with its top line at `top`; returns the y of the next row.
fn write_row(layer: &PdfLayerReference, lines: &RowLines, top: f32, font: &IndirectFontRef) -> f32 {
    for ((x, _), cell_lines) in COLUMNS.iter().zip(lines.iter()) {
        for (i, line) in cell_lines.iter().enumerate() {
            layer.use_text(
                line.as_str(),
                FONT_SIZE,
                Mm(*x),
                Mm(top - i as f32 * LINE_HEIGHT),
                font,
            );
        }
    }
    top - row_height(lines)
}

/// Greedy word wrap by character count. Words wider than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current.is_empty() { word.len() } else { current.chars().count() + 1 + word.len() };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    if lines.len() > MAX_CELL_LINES {
        lines.truncate(MAX_CELL_LINES);
        if let Some(last) = lines.last_mut() {
            last.push_str("...");
        }
    }
    lines
}
