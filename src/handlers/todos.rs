use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::error::{api_error, store_error, ApiError};
use crate::models::{ids::parse_uuid, NewTodo, Todo};
use crate::session::{todo_added_message, todos_removed_message};
use crate::AppState;

#[derive(Deserialize)]
pub struct TodoQuery {
    pub author: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
    pub body: Option<String>,
    pub author: String,
}

// List all todos, or only one author's when `?author=` is given
pub async fn list_todos(
    Query(query): Query<TodoQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = match query.author.as_deref() {
        Some(author) => state.todos.find_by_owner(author).await,
        None => state.todos.find_all().await,
    }
    .map_err(|e| store_error("Error fetching todos", e))?;

    Ok(Json(todos))
}

pub async fn create_todo(
    State(state): State<AppState>,
    Json(payload): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let new_todo = NewTodo::new(payload.title, payload.body.unwrap_or_default(), payload.author);
    new_todo
        .validate()
        .map_err(|message| api_error(StatusCode::BAD_REQUEST, message))?;

    let todo = state
        .todos
        .create(new_todo)
        .await
        .map_err(|e| store_error("Error creating todo", e))?;

    state.hub.publish(todo_added_message(&todo.author));

    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn get_todo(
    Path(todo_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_uuid(&todo_id, "todo_id").map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    state
        .todos
        .find_by_id(id)
        .await
        .map_err(|e| store_error("Error fetching todo", e))?
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Todo not found"))
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub author: Option<String>,
}

pub async fn delete_todo(
    Path(todo_id): Path<String>,
    Query(query): Query<DeleteQuery>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&todo_id, "todo_id").map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    state
        .todos
        .delete_by_id(id)
        .await
        .map_err(|e| store_error("Error deleting todo", e))?;

    let author = query.author.as_deref().unwrap_or("anonymous");
    state.hub.publish(todos_removed_message(1, author));

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_all_todos(
    Query(query): Query<DeleteQuery>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let count = state
        .todos
        .find_all()
        .await
        .map_err(|e| store_error("Error fetching todos", e))?
        .len();

    state
        .todos
        .delete_all()
        .await
        .map_err(|e| store_error("Error deleting todos", e))?;

    let author = query.author.as_deref().unwrap_or("anonymous");
    tracing::info!("All todos deleted by {}", author);
    state.hub.publish(todos_removed_message(count, author));

    Ok(StatusCode::NO_CONTENT)
}
