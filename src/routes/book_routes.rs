use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::{Book, BookCandidate};
use crate::routes::json_body;
use crate::state::AppState;

pub async fn list_books_handler(State(state): State<AppState>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.books.list().await?))
}

pub async fn create_book_handler(
    State(state): State<AppState>,
    payload: Result<Json<BookCandidate>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let candidate = json_body(payload)?;
    Ok((StatusCode::CREATED, Json(state.books.create(&candidate).await?)))
}

pub async fn get_book_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(state.books.get(&id).await?))
}

pub async fn update_book_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<BookCandidate>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let partial = json_body(payload)?;
    Ok(Json(state.books.update(&id, &partial).await?))
}

pub async fn delete_book_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.books.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
