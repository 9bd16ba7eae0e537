use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use crate::errors::AppError;
use crate::models::{ChatRequest, ChatResponse, Conversation, Message};
use crate::routes::json_body;
use crate::state::AppState;

/// POST `/api/chat`: `{conversation_id|null, message, model?}`; a null id
/// starts a new conversation
pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let request = json_body(payload)?;
    Ok(Json(state.chat.chat(request).await?))
}

/// GET `/api/conversations`: most recently active first
pub async fn list_conversations_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Conversation>>, AppError> {
    Ok(Json(state.chat.get_conversations().await?))
}

/// GET `/api/messages/{conversation_id}`: the thread in send order
pub async fn list_messages_handler(
    Path(conversation_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(state.chat.get_messages(&conversation_id).await?))
}
