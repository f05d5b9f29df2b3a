pub mod exports;
pub mod files;
pub mod pages;
pub mod todos;

pub use exports::{export_pdf_file, export_xlsx, ExportRequest};
pub use files::{clear_files, download_file, list_files, upload_file, UploadPolicy};
pub use pages::{health_check, index, todo_page};
pub use todos::{
    create_todo,
    delete_all_todos,
    delete_todo,
    get_todo,
    list_todos,
    CreateTodoRequest,
};
