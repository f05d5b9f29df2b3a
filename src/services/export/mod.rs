//! Spreadsheet and PDF exports of a todo selection.
//!
//! Both generators are pure functions of the given slice: rows come out in the slice's
//! iteration order and nothing is read from the stores. Either the whole document is
//! produced or an `ExportError` is returned; there is no partial output.

pub mod pdf;
pub mod spreadsheet;

pub use pdf::export_pdf;
pub use spreadsheet::export_spreadsheet;

use crate::models::Todo;
use crate::utils::date::format_timestamp;

pub const HEADERS: [&str; 4] = ["Title", "Body", "Author", "Created At"];

pub const XLSX_FILENAME: &str = "todos.xlsx";
pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PDF_FILENAME: &str = "todos.pdf";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("spreadsheet generation failed: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Cell values for one todo, in `HEADERS` order.
pub fn row_cells(todo: &Todo) -> [String; 4] {
    [
        todo.title.clone(),
        todo.body.clone(),
        todo.author.clone(),
        format_timestamp(&todo.created_at),
    ]
}

/// Header row followed by one row per todo.
pub fn table(todos: &[Todo]) -> Vec<[String; 4]> {
    let mut rows = Vec::with_capacity(todos.len() + 1);
    rows.push(HEADERS.map(String::from));
    rows.extend(todos.iter().map(row_cells));
    rows
}
