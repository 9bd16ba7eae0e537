use std::sync::Arc;

use sqlx::PgPool;

use crate::agent::ChatAgent;
use crate::db::{
    AuthorRepository, BookRepository, MemoryAuthorRepository, MemoryBookRepository,
    MemoryConversationRepository, MemoryMessageRepository, MemoryTaskRepository,
    PgAuthorRepository, PgBookRepository, PgConversationRepository, PgMessageRepository,
    PgTaskRepository,
};
use crate::service::{AuthorService, BookService, ChatService, TaskService};

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
    pub authors: AuthorService,
    pub books: BookService,
    pub chat: ChatService,
}

impl AppState {
    pub fn postgres(pool: PgPool, agent: Arc<dyn ChatAgent>) -> Self {
        let authors: Arc<dyn AuthorRepository> = Arc::new(PgAuthorRepository::new(pool.clone()));
        let books: Arc<dyn BookRepository> = Arc::new(PgBookRepository::new(pool.clone()));
        Self {
            tasks: TaskService::new(Arc::new(PgTaskRepository::new(pool.clone()))),
            authors: AuthorService::new(authors.clone(), books.clone()),
            books: BookService::new(books, authors),
            chat: ChatService::new(
                Arc::new(PgConversationRepository::new(pool.clone())),
                Arc::new(PgMessageRepository::new(pool)),
                agent,
            ),
        }
    }

    pub fn in_memory(agent: Arc<dyn ChatAgent>) -> Self {
        let authors: Arc<dyn AuthorRepository> = Arc::new(MemoryAuthorRepository::new());
        let books: Arc<dyn BookRepository> = Arc::new(MemoryBookRepository::new());
        Self {
            tasks: TaskService::new(Arc::new(MemoryTaskRepository::new())),
            authors: AuthorService::new(authors.clone(), books.clone()),
            books: BookService::new(books, authors),
            chat: ChatService::new(
                Arc::new(MemoryConversationRepository::new()),
                Arc::new(MemoryMessageRepository::new()),
                agent,
            ),
        }
    }
}
