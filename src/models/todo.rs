use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ids::TodoId;

pub const TITLE_REQUIRED: &str = "Please enter a title";

/// A stored todo. `id` and `created_at` are assigned by the store and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Input for `TodoStore::create`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub author: String,
}

impl NewTodo {
    pub fn new(title: impl Into<String>, body: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            author: author.into(),
        }
    }

    /// Title must be non-empty after trimming. The error text is user-facing.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err(TITLE_REQUIRED);
        }
        Ok(())
    }
}
