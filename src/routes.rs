use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{self, files::MULTIPART_OVERHEAD_BYTES};
use crate::middleware::security_headers_middleware;
use crate::websocket;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/t/:author", get(handlers::todo_page))
        .route("/ws/t/:author", get(websocket::session_socket))
        .route(
            "/api/todos",
            get(handlers::list_todos)
                .post(handlers::create_todo)
                .delete(handlers::delete_all_todos),
        )
        .route(
            "/api/todos/:id",
            get(handlers::get_todo).delete(handlers::delete_todo),
        )
        .route(
            "/api/files",
            get(handlers::list_files)
                .post(handlers::upload_file)
                .delete(handlers::clear_files),
        )
        .route("/api/files/:id/content", get(handlers::download_file))
        .route("/api/export/xlsx", post(handlers::export_xlsx))
        .route("/api/export/pdf", post(handlers::export_pdf_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
