use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Top-level application error.
/// All variants carry a human-readable message for display/logging.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Database errors ──────────────────────────────────────────────────────
    #[error("Database connection failed: {0}")]
    DatabaseConnectionFailed(#[source] sqlx::Error),

    #[error("Database query failed: {message}")]
    DatabaseQueryFailed {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("{entity_type} not found")]
    RecordNotFound { entity_type: &'static str, id: String },

    #[error("{message}")]
    Conflict { message: String },

    // ── AI Agent errors ──────────────────────────────────────────────────────
    #[error("Chat agent unavailable at {host}")]
    AgentUnavailable { host: String },

    #[error("Model '{model_name}' not found")]
    ModelNotFound { model_name: String },

    #[error("Agent error: {message}")]
    AgentFailed { message: String },

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Validation failed")]
    ValidationFailed { details: Vec<String> },

    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Field '{field_name}' exceeds max length of {max_length} (actual: {actual_length})")]
    FieldTooLong { field_name: String, max_length: usize, actual_length: usize },

    #[error("Invalid id format")]
    InvalidId { id: String },

    #[error("{message}")]
    BadRequest { message: String, details: Vec<String> },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Wire shape of every error response: `{ "error": ..., "details": [...] }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl AppError {
    pub fn db_query(message: impl Into<String>, source: sqlx::Error) -> Self {
        AppError::DatabaseQueryFailed { message: message.into(), source }
    }

    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        AppError::RecordNotFound { entity_type, id: id.into() }
    }

    pub fn validation(details: Vec<String>) -> Self {
        AppError::ValidationFailed { details }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::RecordNotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::ValidationFailed { .. }
                | AppError::EmptyField { .. }
                | AppError::FieldTooLong { .. }
                | AppError::InvalidId { .. }
                | AppError::BadRequest { .. }
        )
    }

    pub fn is_agent_unavailable(&self) -> bool {
        matches!(self, AppError::AgentUnavailable { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else if self.is_agent_unavailable() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            match self {
                AppError::Conflict { .. } => StatusCode::CONFLICT,
                AppError::ModelNotFound { .. } | AppError::AgentFailed { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    /// Builds the response body. Internal faults get a generic message.
    pub fn body(&self) -> ErrorBody {
        let details = match self {
            AppError::ValidationFailed { details } | AppError::BadRequest { details, .. } => {
                details.clone()
            }
            _ => Vec::new(),
        };
        let error = if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            "Server error".to_string()
        } else {
            self.to_string()
        };
        ErrorBody { error, details }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Unhandled error: {self:?}");
        }
        (status, Json(self.body())).into_response()
    }
}
