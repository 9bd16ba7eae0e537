//! Process-local repositories used for `USE_INMEMORY=true` and in tests.
//!
//! Each map sits behind a [`RwLock`]; every operation takes the lock once,
//! which gives the same single-record atomicity as one SQL statement.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    AuthorRepository, BookRepository, ConversationRepository, MessageRepository, TaskRepository,
    DUPLICATE_EMAIL,
};
use crate::errors::AppError;
use crate::models::{Author, Book, Conversation, Message, Task};
use crate::query::{PageWindow, QueryPlan};

#[derive(Default)]
pub struct MemoryTaskRepository {
    tasks: RwLock<HashMap<String, Task>>,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn find_page(&self, plan: &QueryPlan) -> Result<(Vec<Task>, u64), AppError> {
        let tasks = self.tasks.read().await;
        let mut matched: Vec<&Task> = tasks.values().filter(|t| plan.filter.matches(t)).collect();
        matched.sort_by(|a, b| plan.sort.compare(a, b));

        let total = matched.len() as u64;
        let offset = usize::try_from(plan.offset).unwrap_or(usize::MAX);
        let items = matched
            .into_iter()
            .skip(offset)
            .take(plan.limit as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>, AppError> {
        Ok(self.tasks.read().await.get(id).cloned())
    }

    async fn insert(&self, task: &Task) -> Result<Task, AppError> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(AppError::Conflict { message: "Duplicate key".to_string() });
        }
        tasks.insert(task.id.clone(), task.clone());
        Ok(task.clone())
    }

    async fn update(&self, task: &Task) -> Result<Option<Task>, AppError> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.get_mut(&task.id).map(|stored| {
            *stored = task.clone();
            stored.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.tasks.write().await.remove(id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryBookRepository {
    books: RwLock<HashMap<String, Book>>,
}

impl MemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn isbn_taken(books: &HashMap<String, Book>, candidate: &Book) -> bool {
    books.values().any(|b| b.isbn == candidate.isbn && b.id != candidate.id)
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn find_all(&self) -> Result<Vec<Book>, AppError> {
        let books = self.books.read().await;
        let mut all: Vec<Book> = books.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, AppError> {
        Ok(self.books.read().await.get(id).cloned())
    }

    async fn find_by_author(&self, author_id: &str) -> Result<Vec<Book>, AppError> {
        let books = self.books.read().await;
        let mut written: Vec<Book> =
            books.values().filter(|b| b.author_id == author_id).cloned().collect();
        written.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(written)
    }

    async fn insert(&self, book: &Book) -> Result<Book, AppError> {
        let mut books = self.books.write().await;
        if isbn_taken(&books, book) {
            return Err(AppError::Conflict { message: "ISBN already exists".to_string() });
        }
        books.insert(book.id.clone(), book.clone());
        Ok(book.clone())
    }

    async fn update(&self, book: &Book) -> Result<Option<Book>, AppError> {
        let mut books = self.books.write().await;
        if isbn_taken(&books, book) {
            return Err(AppError::Conflict { message: "ISBN already exists".to_string() });
        }
        Ok(books.get_mut(&book.id).map(|stored| {
            *stored = book.clone();
            stored.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.books.write().await.remove(id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryAuthorRepository {
    authors: RwLock<HashMap<String, Author>>,
}

impl MemoryAuthorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(authors: &HashMap<String, Author>, candidate: &Author) -> bool {
    authors.values().any(|a| a.email == candidate.email && a.id != candidate.id)
}

#[async_trait]
impl AuthorRepository for MemoryAuthorRepository {
    async fn find_page(&self, window: &PageWindow) -> Result<(Vec<Author>, u64), AppError> {
        let authors = self.authors.read().await;
        let mut all: Vec<&Author> = authors.values().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = all.len() as u64;
        let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
        let items = all
            .into_iter()
            .skip(offset)
            .take(window.limit as usize)
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Author>, AppError> {
        Ok(self.authors.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Author>, AppError> {
        Ok(self.authors.read().await.values().find(|a| a.email == email).cloned())
    }

    async fn insert(&self, author: &Author) -> Result<Author, AppError> {
        let mut authors = self.authors.write().await;
        if email_taken(&authors, author) {
            return Err(AppError::Conflict { message: DUPLICATE_EMAIL.to_string() });
        }
        authors.insert(author.id.clone(), author.clone());
        Ok(author.clone())
    }

    async fn update(&self, author: &Author) -> Result<Option<Author>, AppError> {
        let mut authors = self.authors.write().await;
        if email_taken(&authors, author) {
            return Err(AppError::Conflict { message: DUPLICATE_EMAIL.to_string() });
        }
        Ok(authors.get_mut(&author.id).map(|stored| {
            *stored = author.clone();
            stored.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.authors.write().await.remove(id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryConversationRepository {
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl MemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for MemoryConversationRepository {
    async fn find_all(&self) -> Result<Vec<Conversation>, AppError> {
        let conversations = self.conversations.read().await;
        let mut all: Vec<Conversation> = conversations.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Conversation>, AppError> {
        Ok(self.conversations.read().await.get(id).cloned())
    }

    async fn save(&self, conversation: &Conversation) -> Result<Conversation, AppError> {
        let mut conversations = self.conversations.write().await;
        if conversations.contains_key(&conversation.id) {
            return Err(AppError::Conflict { message: "Duplicate key".to_string() });
        }
        conversations.insert(conversation.id.clone(), conversation.clone());
        Ok(conversation.clone())
    }

    async fn update_timestamp(&self, id: &str) -> Result<(), AppError> {
        if let Some(conversation) = self.conversations.write().await.get_mut(id) {
            conversation.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMessageRepository {
    threads: RwLock<HashMap<String, Vec<Message>>>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn find_by_conversation_id(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Message>, AppError> {
        Ok(self.threads.read().await.get(conversation_id).cloned().unwrap_or_default())
    }

    async fn save(&self, message: &Message) -> Result<Message, AppError> {
        self.threads
            .write()
            .await
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message.clone());
        Ok(message.clone())
    }
}
