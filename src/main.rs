use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use todo_app::config::{Config, LogFormat, StorageBackend};
use todo_app::services::{seed_data, PgFileStore, PgTodoStore};
use todo_app::{database, routes, AppState, BroadcastHub};

const DEFAULT_LOG_FILTER: &str = "todo_app=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    info!("Starting Todo server...");

    let state = match config.storage_backend {
        StorageBackend::Postgres => {
            let db_pool = database::new_pool(&config).await?;
            info!("Database connection pool created");
            database::run_migrations(&db_pool).await?;

            AppState {
                todos: Arc::new(PgTodoStore::new(db_pool.clone(), config.store_timeout)),
                files: Arc::new(PgFileStore::new(db_pool, config.store_timeout)),
                hub: Arc::new(BroadcastHub::new(config.hub_queue_capacity)),
                config: Arc::new(config),
            }
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; todos and files are lost on restart");
            AppState::in_memory(config)
        }
    };

    if state.config.seed_demo_data {
        seed_data::seed_demo_todos(state.todos.as_ref()).await?;
    }

    let hub = state.hub.clone();
    let addr = format!("0.0.0.0:{}", state.config.port);
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    // Graceful shutdown
    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutting down gracefully...");
        }
    }

    hub.shutdown();

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
