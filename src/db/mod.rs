//! Storage seams. Services depend on these traits only; `Pg*` types back
//! them with PostgreSQL and `memory` with process-local maps.

pub mod author_repository;
pub mod book_repository;
pub mod conversation_repository;
pub mod memory;
pub mod message_repository;
pub mod task_repository;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{Author, Book, Conversation, Message, Task};
use crate::query::{PageWindow, QueryPlan};

pub use author_repository::PgAuthorRepository;
pub use book_repository::PgBookRepository;
pub use conversation_repository::PgConversationRepository;
pub use memory::{
    MemoryAuthorRepository, MemoryBookRepository, MemoryConversationRepository, MemoryMessageRepository,
    MemoryTaskRepository,
};
pub use message_repository::PgMessageRepository;
pub use task_repository::PgTaskRepository;

pub const DUPLICATE_EMAIL: &str = "Email already registered";
pub const UNKNOWN_AUTHOR: &str = "Author does not exist";
pub const AUTHOR_HAS_BOOKS: &str = "Cannot delete author with associated books";

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Returns the requested window and the size of the full match set.
    async fn find_page(&self, plan: &QueryPlan) -> Result<(Vec<Task>, u64), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Task>, AppError>;
    async fn insert(&self, task: &Task) -> Result<Task, AppError>;
    /// Overwrites the stored record; `None` if it no longer exists.
    async fn update(&self, task: &Task) -> Result<Option<Task>, AppError>;
    /// `true` if a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Book>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, AppError>;
    /// Books written by `author_id`, oldest first.
    async fn find_by_author(&self, author_id: &str) -> Result<Vec<Book>, AppError>;
    async fn insert(&self, book: &Book) -> Result<Book, AppError>;
    async fn update(&self, book: &Book) -> Result<Option<Book>, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Oldest first, windowed, with the total author count.
    async fn find_page(&self, window: &PageWindow) -> Result<(Vec<Author>, u64), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Author>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Author>, AppError>;
    async fn insert(&self, author: &Author) -> Result<Author, AppError>;
    async fn update(&self, author: &Author) -> Result<Option<Author>, AppError>;
    /// `true` if a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Most recently updated first.
    async fn find_all(&self) -> Result<Vec<Conversation>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Conversation>, AppError>;
    async fn save(&self, conversation: &Conversation) -> Result<Conversation, AppError>;
    async fn update_timestamp(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Messages in insertion order.
    async fn find_by_conversation_id(&self, conversation_id: &str)
        -> Result<Vec<Message>, AppError>;
    async fn save(&self, message: &Message) -> Result<Message, AppError>;
}

/// Maps a failed write, turning unique-key violations into `Conflict`.
pub(crate) fn write_error(context: &str, conflict: &str, e: sqlx::Error) -> AppError {
    let is_unique = e
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if is_unique {
        AppError::Conflict { message: conflict.to_string() }
    } else {
        tracing::error!("{context}: {e}");
        AppError::db_query(context.to_string(), e)
    }
}

/// Maps a failed write that broke a foreign key to a 400 carrying `message`;
/// everything else goes through [`write_error`].
pub(crate) fn reference_error(
    context: &str,
    conflict: &str,
    message: &str,
    e: sqlx::Error,
) -> AppError {
    let is_dangling = e
        .as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation());
    if is_dangling {
        AppError::BadRequest { message: message.to_string(), details: Vec::new() }
    } else {
        write_error(context, conflict, e)
    }
}
