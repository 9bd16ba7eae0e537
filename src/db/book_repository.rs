use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;

use super::{reference_error, BookRepository, UNKNOWN_AUTHOR};
use crate::errors::AppError;
use crate::models::Book;

const BOOK_COLUMNS: &str =
    "id, title, isbn, publication_year, available_copies, author_id, created_at, updated_at";
const DUPLICATE_ISBN: &str = "ISBN already exists";

#[derive(Clone)]
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn find_all(&self) -> Result<Vec<Book>, AppError> {
        sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch books: {e}");
            AppError::db_query("Failed to fetch books", e)
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, AppError> {
        sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to find book {id}: {e}");
                AppError::db_query(format!("Failed to find book {id}"), e)
            })
    }

    async fn find_by_author(&self, author_id: &str) -> Result<Vec<Book>, AppError> {
        sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE author_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch books of author {author_id}: {e}");
            AppError::db_query(format!("Failed to fetch books of author {author_id}"), e)
        })
    }

    async fn insert(&self, book: &Book) -> Result<Book, AppError> {
        sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books ({BOOK_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(book.publication_year)
        .bind(book.available_copies)
        .bind(&book.author_id)
        .bind(book.created_at)
        .bind(book.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| reference_error("Failed to save book", DUPLICATE_ISBN, UNKNOWN_AUTHOR, e))
    }

    async fn update(&self, book: &Book) -> Result<Option<Book>, AppError> {
        sqlx::query_as::<_, Book>(&format!(
            "UPDATE books
             SET title = $2, isbn = $3, publication_year = $4, available_copies = $5,
                 author_id = $6, updated_at = $7
             WHERE id = $1
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(book.publication_year)
        .bind(book.available_copies)
        .bind(&book.author_id)
        .bind(book.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| reference_error("Failed to update book", DUPLICATE_ISBN, UNKNOWN_AUTHOR, e))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete book {id}: {e}");
                AppError::db_query(format!("Failed to delete book {id}"), e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
