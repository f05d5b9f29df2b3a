use rust_xlsxwriter::{Format, Workbook};

use super::{table, ExportError};
use crate::models::Todo;

pub const SHEET_NAME: &str = "Todos";

const COLUMN_WIDTHS: [f64; 4] = [30.0, 50.0, 20.0, 18.0];

/// Build `todos.xlsx`: one sheet, header in row 0, then one row per todo.
pub fn export_spreadsheet(todos: &[Todo]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;
    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }

    for (row, cells) in table(todos).iter().enumerate() {
        let row = row as u32;
        for (col, value) in cells.iter().enumerate() {
            if row == 0 {
                worksheet.write_string_with_format(row, col as u16, value, &header_format)?;
            } else {
                worksheet.write_string(row, col as u16, value)?;
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    tracing::debug!("Spreadsheet export: {} todos, {} bytes", todos.len(), bytes.len());
    Ok(bytes)
}
