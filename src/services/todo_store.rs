use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::database::DatabasePool;
use crate::error::StoreError;
use crate::models::{NewTodo, Todo, TodoId};
use crate::services::bounded;
use crate::utils::date::stored_now;

/// Persistent collection of todos.
///
/// `find_all` makes no ordering promise. Deleting an id that does not exist is not an
/// error, so `delete_all` can be repeated safely.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Assigns `id` and `created_at` and returns the stored record.
    async fn create(&self, todo: NewTodo) -> Result<Todo, StoreError>;

    async fn find_all(&self) -> Result<Vec<Todo>, StoreError>;

    async fn find_by_owner(&self, author: &str) -> Result<Vec<Todo>, StoreError>;

    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError>;

    async fn delete_by_id(&self, id: TodoId) -> Result<(), StoreError>;

    async fn delete(&self, todo: &Todo) -> Result<(), StoreError> {
        self.delete_by_id(todo.id).await
    }

    async fn delete_all(&self) -> Result<(), StoreError>;
}

pub struct PgTodoStore {
    pool: DatabasePool,
    timeout: Duration,
}

impl PgTodoStore {
    pub fn new(pool: DatabasePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn create(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let query = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (id, title, body, author, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, body, author, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(todo.title.trim())
        .bind(&todo.body)
        .bind(&todo.author)
        .bind(stored_now())
        .fetch_one(&*self.pool);

        let created = bounded(self.timeout, query).await?;
        tracing::debug!("Todo {} created by {}", created.id, created.author);
        Ok(created)
    }

    async fn find_all(&self) -> Result<Vec<Todo>, StoreError> {
        let query = sqlx::query_as::<_, Todo>(
            "SELECT id, title, body, author, created_at FROM todos ORDER BY created_at, id",
        )
        .fetch_all(&*self.pool);

        bounded(self.timeout, query).await
    }

    async fn find_by_owner(&self, author: &str) -> Result<Vec<Todo>, StoreError> {
        let query = sqlx::query_as::<_, Todo>(
            "SELECT id, title, body, author, created_at FROM todos WHERE author = $1 ORDER BY created_at, id",
        )
        .bind(author)
        .fetch_all(&*self.pool);

        bounded(self.timeout, query).await
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        let query = sqlx::query_as::<_, Todo>(
            "SELECT id, title, body, author, created_at FROM todos WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool);

        bounded(self.timeout, query).await
    }

    async fn delete_by_id(&self, id: TodoId) -> Result<(), StoreError> {
        let query = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&*self.pool);

        let result = bounded(self.timeout, query).await?;
        if result.rows_affected() == 0 {
            tracing::debug!("Delete of todo {} matched no rows", id);
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let query = sqlx::query("DELETE FROM todos").execute(&*self.pool);

        let result = bounded(self.timeout, query).await?;
        tracing::info!("Deleted {} todos", result.rows_affected());
        Ok(())
    }
}
