use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;

use super::{reference_error, write_error, AuthorRepository, AUTHOR_HAS_BOOKS, DUPLICATE_EMAIL};
use crate::errors::AppError;
use crate::models::Author;
use crate::query::PageWindow;

const AUTHOR_COLUMNS: &str = "id, first_name, last_name, email, created_at, updated_at";

#[derive(Clone)]
pub struct PgAuthorRepository {
    pool: PgPool,
}

impl PgAuthorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorRepository for PgAuthorRepository {
    async fn find_page(&self, window: &PageWindow) -> Result<(Vec<Author>, u64), AppError> {
        let select = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors
             ORDER BY created_at ASC, id COLLATE \"C\" ASC
             LIMIT $1 OFFSET $2"
        );
        let (authors, total) = futures_util::future::try_join(
            sqlx::query_as::<_, Author>(&select)
                .bind(i64::from(window.limit))
                .bind(i64::try_from(window.offset).unwrap_or(i64::MAX))
                .fetch_all(&self.pool),
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM authors").fetch_one(&self.pool),
        )
        .await
        .map_err(|e| {
            error!("Failed to list authors: {e}");
            AppError::db_query("Failed to list authors", e)
        })?;

        Ok((authors, u64::try_from(total).unwrap_or_default()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Author>, AppError> {
        sqlx::query_as::<_, Author>(&format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to find author {id}: {e}");
                AppError::db_query(format!("Failed to find author {id}"), e)
            })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Author>, AppError> {
        sqlx::query_as::<_, Author>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to look up author by email: {e}");
            AppError::db_query("Failed to look up author by email", e)
        })
    }

    async fn insert(&self, author: &Author) -> Result<Author, AppError> {
        sqlx::query_as::<_, Author>(&format!(
            "INSERT INTO authors ({AUTHOR_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {AUTHOR_COLUMNS}"
        ))
        .bind(&author.id)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(&author.email)
        .bind(author.created_at)
        .bind(author.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error("Failed to save author", DUPLICATE_EMAIL, e))
    }

    async fn update(&self, author: &Author) -> Result<Option<Author>, AppError> {
        sqlx::query_as::<_, Author>(&format!(
            "UPDATE authors
             SET first_name = $2, last_name = $3, email = $4, updated_at = $5
             WHERE id = $1
             RETURNING {AUTHOR_COLUMNS}"
        ))
        .bind(&author.id)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(&author.email)
        .bind(author.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| write_error("Failed to update author", DUPLICATE_EMAIL, e))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                reference_error("Failed to delete author", DUPLICATE_EMAIL, AUTHOR_HAS_BOOKS, e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
