use axum::{
    extract::State,
    http::StatusCode,
    response::{Json, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{api_error, export_error, store_error, ApiError};
use crate::handlers::files::attachment;
use crate::models::Todo;
use crate::services::export::{
    export_pdf, export_spreadsheet, PDF_CONTENT_TYPE, PDF_FILENAME, XLSX_CONTENT_TYPE, XLSX_FILENAME,
};
use crate::AppState;

pub const EXPORT_SELECTION_REQUIRED: &str = "Please select at least one item to export";

/// The client's current selection, in display order.
#[derive(Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub ids: Vec<Uuid>,
}

pub async fn export_xlsx(
    State(state): State<AppState>,
    Json(payload): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let todos = selected_todos(&state, &payload.ids).await?;
    let bytes = export_spreadsheet(&todos).map_err(export_error)?;
    Ok(attachment(XLSX_FILENAME, XLSX_CONTENT_TYPE, bytes))
}

pub async fn export_pdf_file(
    State(state): State<AppState>,
    Json(payload): Json<ExportRequest>,
) -> Result<Response, ApiError> {
    let todos = selected_todos(&state, &payload.ids).await?;
    let bytes = export_pdf(&todos).map_err(export_error)?;
    Ok(attachment(PDF_FILENAME, PDF_CONTENT_TYPE, bytes))
}

/// Resolve the selection against the store, keeping request order. Ids deleted since
/// the client last refreshed are skipped.
async fn selected_todos(state: &AppState, ids: &[Uuid]) -> Result<Vec<Todo>, ApiError> {
    if ids.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, EXPORT_SELECTION_REQUIRED));
    }

    let mut todos = Vec::with_capacity(ids.len());
    for id in ids {
        match state.todos.find_by_id(*id).await {
            Ok(Some(todo)) => todos.push(todo),
            Ok(None) => tracing::debug!("Export skipped missing todo {}", id),
            Err(e) => return Err(store_error("Error loading todos for export", e)),
        }
    }

    if todos.is_empty() {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            "None of the selected items exist anymore",
        ));
    }
    Ok(todos)
}
