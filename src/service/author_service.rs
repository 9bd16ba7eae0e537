use std::sync::Arc;

use tracing::info;

use crate::db::{AuthorRepository, BookRepository, AUTHOR_HAS_BOOKS, DUPLICATE_EMAIL};
use crate::errors::AppError;
use crate::models::{Author, AuthorCandidate, Book};
use crate::query::{Page, PageWindow};
use crate::service::task_service::check_id;
use crate::validation::{validate_author_changes, validate_new_author};

fn email_registered() -> AppError {
    AppError::BadRequest { message: DUPLICATE_EMAIL.to_string(), details: Vec::new() }
}

/// A lost race on the unique index surfaces as `Conflict`; report it the
/// same way as the up-front check.
fn registered_on_conflict(e: AppError) -> AppError {
    match e {
        AppError::Conflict { .. } => email_registered(),
        other => other,
    }
}

/// Author catalog. Reads books to answer "what did they write" and to refuse
/// deleting an author that still has any.
#[derive(Clone)]
pub struct AuthorService {
    authors: Arc<dyn AuthorRepository>,
    books: Arc<dyn BookRepository>,
}

impl AuthorService {
    pub fn new(authors: Arc<dyn AuthorRepository>, books: Arc<dyn BookRepository>) -> Self {
        Self { authors, books }
    }

    pub async fn list(&self, window: &PageWindow) -> Result<Page<Author>, AppError> {
        let (items, total) = self.authors.find_page(window).await?;
        Ok(Page::from_window(window, items, total))
    }

    pub async fn create(&self, candidate: &AuthorCandidate) -> Result<Author, AppError> {
        let draft = validate_new_author(candidate)?;
        if self.authors.find_by_email(&draft.email).await?.is_some() {
            return Err(email_registered());
        }
        let author = self
            .authors
            .insert(&Author::new(draft))
            .await
            .map_err(registered_on_conflict)?;
        info!("Created author {}", author.id);
        Ok(author)
    }

    pub async fn get(&self, id: &str) -> Result<Author, AppError> {
        check_id(id)?;
        self.authors
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Author", id))
    }

    pub async fn update(&self, id: &str, partial: &AuthorCandidate) -> Result<Author, AppError> {
        check_id(id)?;
        let changes = validate_author_changes(partial)?;
        let mut author = self.get(id).await?;
        if let Some(email) = &changes.email {
            let holder = self.authors.find_by_email(email).await?;
            if holder.is_some_and(|other| other.id != author.id) {
                return Err(email_registered());
            }
        }
        author.apply(changes);
        self.authors
            .update(&author)
            .await
            .map_err(registered_on_conflict)?
            .ok_or_else(|| AppError::not_found("Author", id))
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.get(id).await?;
        if !self.books.find_by_author(id).await?.is_empty() {
            return Err(AppError::BadRequest {
                message: AUTHOR_HAS_BOOKS.to_string(),
                details: Vec::new(),
            });
        }
        if self.authors.delete(id).await? {
            info!("Deleted author {id}");
            Ok(())
        } else {
            Err(AppError::not_found("Author", id))
        }
    }

    pub async fn books(&self, id: &str) -> Result<Vec<Book>, AppError> {
        self.get(id).await?;
        self.books.find_by_author(id).await
    }
}
