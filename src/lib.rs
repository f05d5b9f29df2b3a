// Library root - exports for the binary and the integration tests

pub mod broadcast;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod utils;
pub mod websocket;

pub use broadcast::{BroadcastHub, Subscription};
pub use config::Config;
pub use error::StoreError;

use services::{FileStore, InMemoryFileStore, InMemoryTodoStore, TodoStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub todos: Arc<dyn TodoStore>,
    pub files: Arc<dyn FileStore>,
    pub hub: Arc<BroadcastHub>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by the process-local stores.
    pub fn in_memory(config: Config) -> Self {
        let hub = BroadcastHub::new(config.hub_queue_capacity);
        Self {
            todos: Arc::new(InMemoryTodoStore::new()),
            files: Arc::new(InMemoryFileStore::new()),
            hub: Arc::new(hub),
            config: Arc::new(config),
        }
    }
}
