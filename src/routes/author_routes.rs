use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::{Author, AuthorCandidate, Book};
use crate::query::{Page, PageParams, PageWindow};
use crate::routes::{json_body, query_params};
use crate::state::AppState;

/// GET `/api/authors?page=&size=`
pub async fn list_authors_handler(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Page<Author>>, AppError> {
    let window = PageWindow::from_params(&query_params(params)?);
    Ok(Json(state.authors.list(&window).await?))
}

pub async fn create_author_handler(
    State(state): State<AppState>,
    payload: Result<Json<AuthorCandidate>, JsonRejection>,
) -> Result<(StatusCode, Json<Author>), AppError> {
    let candidate = json_body(payload)?;
    Ok((StatusCode::CREATED, Json(state.authors.create(&candidate).await?)))
}

pub async fn get_author_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Author>, AppError> {
    Ok(Json(state.authors.get(&id).await?))
}

pub async fn update_author_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<AuthorCandidate>, JsonRejection>,
) -> Result<Json<Author>, AppError> {
    let partial = json_body(payload)?;
    Ok(Json(state.authors.update(&id, &partial).await?))
}

pub async fn delete_author_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.authors.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/api/authors/{id}/books`: the author's books, oldest first
pub async fn author_books_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.authors.books(&id).await?))
}
