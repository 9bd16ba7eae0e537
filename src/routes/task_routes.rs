use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::{Task, TaskCandidate};
use crate::query::{Page, QueryPlan, TaskQueryParams};
use crate::routes::{json_body, query_params};
use crate::state::AppState;

/// GET `/api/tasks`: filtered, sorted, paginated listing
pub async fn list_tasks_handler(
    State(state): State<AppState>,
    params: Result<Query<TaskQueryParams>, QueryRejection>,
) -> Result<Json<Page<Task>>, AppError> {
    let plan = QueryPlan::compile(&query_params(params)?)?;
    Ok(Json(state.tasks.list(&plan).await?))
}

/// POST `/api/tasks`
pub async fn create_task_handler(
    State(state): State<AppState>,
    payload: Result<Json<TaskCandidate>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let candidate = json_body(payload)?;
    let task = state.tasks.create(&candidate).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET `/api/tasks/{id}`
pub async fn get_task_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(state.tasks.get(&id).await?))
}

/// PUT `/api/tasks/{id}`: partial update; omitted fields are kept
pub async fn update_task_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<TaskCandidate>, JsonRejection>,
) -> Result<Json<Task>, AppError> {
    let partial = json_body(payload)?;
    Ok(Json(state.tasks.update(&id, &partial).await?))
}

/// DELETE `/api/tasks/{id}`
pub async fn delete_task_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.tasks.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
