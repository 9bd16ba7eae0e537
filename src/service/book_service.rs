use std::sync::Arc;

use tracing::info;

use crate::db::{AuthorRepository, BookRepository, UNKNOWN_AUTHOR};
use crate::errors::AppError;
use crate::models::{Book, BookCandidate};
use crate::service::task_service::check_id;
use crate::validation::{validate_book_changes, validate_new_book};

#[derive(Clone)]
pub struct BookService {
    repo: Arc<dyn BookRepository>,
    authors: Arc<dyn AuthorRepository>,
}

impl BookService {
    pub fn new(repo: Arc<dyn BookRepository>, authors: Arc<dyn AuthorRepository>) -> Self {
        Self { repo, authors }
    }

    async fn ensure_author(&self, author_id: &str) -> Result<(), AppError> {
        match self.authors.find_by_id(author_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::BadRequest {
                message: UNKNOWN_AUTHOR.to_string(),
                details: Vec::new(),
            }),
        }
    }

    pub async fn list(&self) -> Result<Vec<Book>, AppError> {
        self.repo.find_all().await
    }

    pub async fn create(&self, candidate: &BookCandidate) -> Result<Book, AppError> {
        let draft = validate_new_book(candidate)?;
        self.ensure_author(&draft.author_id).await?;
        let book = self.repo.insert(&Book::new(draft)).await?;
        info!("Created book {} ({})", book.id, book.isbn);
        Ok(book)
    }

    pub async fn get(&self, id: &str) -> Result<Book, AppError> {
        check_id(id)?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))
    }

    pub async fn update(&self, id: &str, partial: &BookCandidate) -> Result<Book, AppError> {
        check_id(id)?;
        let changes = validate_book_changes(partial)?;
        let mut book = self.get(id).await?;
        if let Some(author_id) = &changes.author_id {
            self.ensure_author(author_id).await?;
        }
        book.apply(changes);
        self.repo
            .update(&book)
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        check_id(id)?;
        if self.repo.delete(id).await? {
            info!("Deleted book {id}");
            Ok(())
        } else {
            Err(AppError::not_found("Book", id))
        }
    }
}
