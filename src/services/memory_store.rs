//! Process-local stores. Used by tests and by `STORAGE_BACKEND=memory`.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{FileDescriptor, FileId, NewTodo, Todo, TodoId};
use crate::services::file_store::{sha256_hex, FileStore};
use crate::services::todo_store::TodoStore;
use crate::utils::date::stored_now;

#[derive(Default)]
pub struct InMemoryTodoStore {
    items: RwLock<Vec<Todo>>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn create(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let created = Todo {
            id: Uuid::new_v4(),
            title: todo.title.trim().to_string(),
            body: todo.body,
            author: todo.author,
            created_at: stored_now(),
        };
        self.items.write().await.push(created.clone());
        Ok(created)
    }

    async fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        Ok(self.items.read().await.clone())
    }

    async fn find_by_owner(&self, author: &str) -> Result<Vec<Todo>, StoreError> {
        let items = self.items.read().await;
        Ok(items.iter().filter(|t| t.author == author).cloned().collect())
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        let items = self.items.read().await;
        Ok(items.iter().find(|t| t.id == id).cloned())
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<(), StoreError> {
        self.items.write().await.retain(|t| t.id != id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.items.write().await.clear();
        Ok(())
    }
}

struct StoredFile {
    descriptor: FileDescriptor,
    content: Arc<Vec<u8>>,
}

#[derive(Default)]
pub struct InMemoryFileStore {
    files: RwLock<Vec<StoredFile>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn store(
        &self,
        content: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<FileDescriptor, StoreError> {
        let descriptor = FileDescriptor {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            length: content.len() as i64,
            sha256: sha256_hex(&content),
            uploaded_at: stored_now(),
        };
        self.files.write().await.push(StoredFile {
            descriptor: descriptor.clone(),
            content: Arc::new(content),
        });
        Ok(descriptor)
    }

    async fn list_all(&self) -> Result<Vec<FileDescriptor>, StoreError> {
        let files = self.files.read().await;
        Ok(files.iter().map(|f| f.descriptor.clone()).collect())
    }

    async fn find(&self, id: FileId) -> Result<Option<FileDescriptor>, StoreError> {
        let files = self.files.read().await;
        Ok(files
            .iter()
            .find(|f| f.descriptor.id == id)
            .map(|f| f.descriptor.clone()))
    }

    async fn fetch_content(&self, descriptor: &FileDescriptor) -> Result<Vec<u8>, StoreError> {
        let files = self.files.read().await;
        files
            .iter()
            .find(|f| f.descriptor.id == descriptor.id)
            .map(|f| f.content.as_ref().clone())
            .ok_or_else(|| StoreError::NotFound(format!("File {}", descriptor.filename)))
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.files.write().await.clear();
        Ok(())
    }
}
