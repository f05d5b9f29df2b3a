use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{api_error, store_error, ApiError};
use crate::models::{ids::parse_uuid, FileDescriptor};
use crate::session::{file_uploaded_message, files_cleared_message};
use crate::AppState;

pub const ALLOWED_MIME_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

/// Multipart framing allowance on top of the file size ceiling.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Upload rules checked before anything reaches the file store.
#[derive(Clone, Debug)]
pub struct UploadPolicy {
    pub max_bytes: usize,
    pub allowed_mime_types: &'static [&'static str],
}

impl UploadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_bytes: config.max_upload_bytes,
            allowed_mime_types: &ALLOWED_MIME_TYPES,
        }
    }

    pub fn accepts_mime_type(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.contains(&mime_type)
    }

    pub fn size_limit_message(&self) -> String {
        format!(
            "File exceeds the maximum upload size of {} MiB",
            self.max_bytes / (1024 * 1024)
        )
    }
}

#[derive(Deserialize)]
pub struct UploadQuery {
    pub author: Option<String>,
}

pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<FileDescriptor>>, ApiError> {
    let files = state
        .files
        .list_all()
        .await
        .map_err(|e| store_error("Error listing files", e))?;

    Ok(Json(files))
}

// Accepts the first multipart field named "file"
pub async fn upload_file(
    Query(query): Query<UploadQuery>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileDescriptor>), ApiError> {
    let policy = UploadPolicy::from_config(&state.config);
    let author = query.author.unwrap_or_else(|| "anonymous".to_string());

    while let Some(mut field) = multipart.next_field().await.map_err(upload_failed)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field.content_type().unwrap_or("application/octet-stream").to_string();

        if !policy.accepts_mime_type(&mime_type) {
            tracing::warn!("File upload failed: {}, Reason: unsupported type {}", filename, mime_type);
            return Err(api_error(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("Upload failed: file type {} is not accepted", mime_type),
            ));
        }

        let mut content = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(upload_failed)? {
            if content.len() + chunk.len() > policy.max_bytes {
                tracing::warn!("File upload failed: {}, Reason: exceeds {} bytes", filename, policy.max_bytes);
                return Err(api_error(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("Upload failed: {}", policy.size_limit_message()),
                ));
            }
            content.extend_from_slice(&chunk);
        }

        let descriptor = state
            .files
            .store(content, &filename, &mime_type)
            .await
            .map_err(|e| store_error("Error uploading file", e))?;

        state.hub.publish(file_uploaded_message(&descriptor.filename, &author));
        return Ok((StatusCode::CREATED, Json(descriptor)));
    }

    Err(api_error(StatusCode::BAD_REQUEST, "Upload failed: no file field in request"))
}

fn upload_failed(e: MultipartError) -> ApiError {
    let status = e.status();
    tracing::warn!("File upload failed: {}", e.body_text());
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return api_error(status, "Upload failed: file exceeds the maximum upload size");
    }
    api_error(status, format!("Upload failed: {}", e.body_text()))
}

pub async fn download_file(
    Path(file_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let id = parse_uuid(&file_id, "file_id").map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let descriptor = state
        .files
        .find(id)
        .await
        .map_err(|e| store_error("Error downloading file", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "File not found"))?;

    let content = state
        .files
        .fetch_content(&descriptor)
        .await
        .map_err(|e| store_error("Error downloading file", e))?;

    Ok(attachment(&descriptor.filename, &descriptor.mime_type, content))
}

pub async fn clear_files(
    Query(query): Query<UploadQuery>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state
        .files
        .delete_all()
        .await
        .map_err(|e| store_error("Error clearing files", e))?;

    let author = query.author.as_deref().unwrap_or("anonymous");
    state.hub.publish(files_cleared_message(author));

    Ok(StatusCode::NO_CONTENT)
}

/// Bytes served as a download with the given filename.
pub fn attachment(filename: &str, content_type: &str, content: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", header_safe(filename));
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response()
}

fn header_safe(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c == '"' || c == '\\' || !(' '..='~').contains(&c) { '_' } else { c })
        .collect()
}
