use axum::response::{Html, Redirect};

pub const DEFAULT_AUTHOR: &str = "guest";

// The page reads its author from the URL and opens /ws/t/<author> itself
pub async fn todo_page() -> Html<&'static str> {
    Html(include_str!("../../static/todo/index.html"))
}

pub async fn index() -> Redirect {
    Redirect::temporary(&format!("/t/{}", DEFAULT_AUTHOR))
}

pub async fn health_check() -> &'static str {
    "OK"
}
