pub mod export;
pub mod file_store;
pub mod memory_store;
pub mod seed_data;
pub mod todo_store;

pub use file_store::{FileStore, PgFileStore};
pub use memory_store::{InMemoryFileStore, InMemoryTodoStore};
pub use todo_store::{PgTodoStore, TodoStore};

use std::future::Future;
use std::time::Duration;

use crate::error::StoreError;

/// Run one database call under the configured store timeout.
pub(crate) async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}
