use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ids::FileId;

/// Metadata for a stored attachment. The content itself stays in the file store
/// until a download asks for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FileDescriptor {
    pub id: FileId,
    pub filename: String,
    pub mime_type: String,
    pub length: i64,
    /// Hex-encoded SHA-256 of the content.
    pub sha256: String,
    pub uploaded_at: DateTime<Utc>,
}
