pub mod author_service;
pub mod book_service;
pub mod chat_service;
pub mod task_service;

pub use author_service::AuthorService;
pub use book_service::BookService;
pub use chat_service::ChatService;
pub use task_service::TaskService;
