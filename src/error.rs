//! Error types shared by the stores and the HTTP layer.
//!
//! Handlers return `Result<_, ApiError>`, where the error half is a status code plus a
//! `{"error": "..."}` body, so every failure reaches the client as a short message it
//! can show in a notification.

use std::time::Duration;

use axum::{http::StatusCode, response::Json};

use crate::services::export::ExportError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Text safe to show to users; driver details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            StoreError::NotFound(what) => format!("{} not found", what),
            StoreError::Unavailable(_) => "Storage is currently unavailable".to_string(),
            StoreError::Timeout(_) => "Storage did not respond in time".to_string(),
        }
    }
}

pub type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

/// Log a store failure and turn it into a response. Not-found is expected and not logged.
pub fn store_error(context: &str, e: StoreError) -> ApiError {
    match &e {
        StoreError::NotFound(_) => {}
        _ => tracing::error!("{}: {:?}", context, e),
    }
    api_error(e.status_code(), e.user_message())
}

pub fn export_error(e: ExportError) -> ApiError {
    tracing::error!("Export failed: {:?}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Error exporting: {}", e))
}
