//! Shared types: todo records, file descriptors, ID aliases.

pub mod file;
pub mod ids;
pub mod todo;

pub use file::FileDescriptor;
pub use ids::{FileId, TodoId};
pub use todo::{NewTodo, Todo};
