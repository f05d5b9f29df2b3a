//! Per-client view state for the todo page.
//!
//! A `SessionView` owns what one connected browser sees: its author tag and the last
//! todos/files it read from the stores. It is driven by two kinds of input, commands
//! from its own client and messages from the broadcast hub, and answers each with the
//! events to send back. Only the session's own task touches it.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::broadcast::Subscription;
use crate::error::StoreError;
use crate::models::{FileDescriptor, NewTodo, Todo, TodoId};
use crate::AppState;

pub const REMOVE_SELECTION_REQUIRED: &str = "Please select at least one item to remove";

/// Commands a client sends over its session socket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionCommand {
    Create {
        title: String,
        #[serde(default)]
        body: String,
    },
    Remove {
        ids: Vec<TodoId>,
    },
    ClearFiles,
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Success,
    Error,
    Contrast,
}

/// Events sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Snapshot {
        author: String,
        todos: Vec<Todo>,
        files: Vec<FileDescriptor>,
    },
    Notification {
        message: String,
        variant: NotificationVariant,
    },
}

impl SessionEvent {
    pub fn notification(message: impl Into<String>, variant: NotificationVariant) -> Self {
        SessionEvent::Notification {
            message: message.into(),
            variant,
        }
    }
}

pub fn todo_added_message(author: &str) -> String {
    format!("Todo Item added by: {}", author)
}

pub fn todos_removed_message(count: usize, author: &str) -> String {
    format!("Removed {} Todo item(s) by: {}", count, author)
}

pub fn file_uploaded_message(filename: &str, author: &str) -> String {
    format!("File {} uploaded by: {}", filename, author)
}

pub fn files_cleared_message(author: &str) -> String {
    format!("All files cleared by: {}", author)
}

pub struct SessionView {
    author: String,
    state: AppState,
    subscription: Subscription,
    todos: Vec<Todo>,
    files: Vec<FileDescriptor>,
}

impl SessionView {
    /// `subscription` is this session's own hub registration; its broadcasts skip it.
    pub fn new(author: impl Into<String>, state: AppState, subscription: Subscription) -> Self {
        Self {
            author: author.into(),
            state,
            subscription,
            todos: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub fn snapshot(&self) -> SessionEvent {
        SessionEvent::Snapshot {
            author: self.author.clone(),
            todos: self.todos.clone(),
            files: self.files.clone(),
        }
    }

    /// First render after the socket opens.
    pub async fn open(&mut self) -> Vec<SessionEvent> {
        match self.reload().await {
            Ok(()) => vec![self.snapshot()],
            Err(e) => vec![self.storage_failure("Error loading todos", e)],
        }
    }

    pub async fn handle_command(&mut self, command: SessionCommand) -> Vec<SessionEvent> {
        match command {
            SessionCommand::Create { title, body } => self.create(title, body).await,
            SessionCommand::Remove { ids } => self.remove(ids).await,
            SessionCommand::ClearFiles => self.clear_files().await,
            SessionCommand::Refresh => match self.reload().await {
                Ok(()) => vec![self.snapshot()],
                Err(e) => vec![self.storage_failure("Error refreshing", e)],
            },
        }
    }

    /// Another session changed shared state: re-read the stores and show the message.
    pub async fn on_broadcast(&mut self, message: &str) -> Vec<SessionEvent> {
        match self.reload().await {
            Ok(()) => vec![
                self.snapshot(),
                SessionEvent::notification(message, NotificationVariant::Success),
            ],
            Err(e) => vec![self.storage_failure("Error refreshing", e)],
        }
    }

    async fn create(&mut self, title: String, body: String) -> Vec<SessionEvent> {
        let todo = NewTodo::new(title, body, self.author.clone());
        if let Err(message) = todo.validate() {
            return vec![SessionEvent::notification(message, NotificationVariant::Error)];
        }

        if let Err(e) = self.state.todos.create(todo).await {
            return vec![self.storage_failure("Error saving todo", e)];
        }
        self.state
            .hub
            .publish_except(self.subscription, todo_added_message(&self.author));

        self.after_mutation("Todo item added successfully").await
    }

    /// Deletes are independent calls; a failure part-way leaves earlier deletes applied.
    async fn remove(&mut self, ids: Vec<TodoId>) -> Vec<SessionEvent> {
        if ids.is_empty() {
            return vec![SessionEvent::notification(
                REMOVE_SELECTION_REQUIRED,
                NotificationVariant::Contrast,
            )];
        }

        let mut removed = 0;
        for id in &ids {
            if let Err(e) = self.state.todos.delete_by_id(*id).await {
                if removed > 0 {
                    self.state
                        .hub
                        .publish_except(self.subscription, todos_removed_message(removed, &self.author));
                }
                let mut events = vec![self.storage_failure("Error removing todos", e)];
                if self.reload().await.is_ok() {
                    events.insert(0, self.snapshot());
                }
                return events;
            }
            removed += 1;
        }

        info!("Session {} removed {} todos", self.author, removed);
        self.state
            .hub
            .publish_except(self.subscription, todos_removed_message(removed, &self.author));

        self.after_mutation(format!("{} item(s) removed successfully", removed))
            .await
    }

    async fn clear_files(&mut self) -> Vec<SessionEvent> {
        if let Err(e) = self.state.files.delete_all().await {
            return vec![self.storage_failure("Error clearing files", e)];
        }
        self.state
            .hub
            .publish_except(self.subscription, files_cleared_message(&self.author));

        self.after_mutation("All files cleared").await
    }

    async fn after_mutation(&mut self, success: impl Into<String>) -> Vec<SessionEvent> {
        let mut events = Vec::with_capacity(2);
        match self.reload().await {
            Ok(()) => events.push(self.snapshot()),
            Err(e) => events.push(self.storage_failure("Error refreshing", e)),
        }
        events.push(SessionEvent::notification(success, NotificationVariant::Success));
        events
    }

    async fn reload(&mut self) -> Result<(), StoreError> {
        let todos = self.state.todos.find_all().await?;
        let files = self.state.files.list_all().await?;
        self.todos = todos;
        self.files = files;
        Ok(())
    }

    fn storage_failure(&self, context: &str, e: StoreError) -> SessionEvent {
        error!("{} (session {}): {:?}", context, self.author, e);
        SessionEvent::notification(
            format!("{}: {}", context, e.user_message()),
            NotificationVariant::Error,
        )
    }
}
