use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;

use crate::models::{
    ApiError, ChatRequest, ChatResponse, Conversation, Message, Task, TaskDraft, TaskFilters,
    TaskPage,
};

/// Base URL of the backend API server.
const API_BASE: &str = "http://localhost:8080/api";

/// Turns a non-2xx response into the server's `error` string, verbatim.
async fn error_of(resp: Response) -> String {
    let status = resp.status();
    match resp.json::<ApiError>().await {
        Ok(body) => body.error,
        Err(_) => format!("Server error: {status}"),
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, String> {
    if !resp.ok() {
        return Err(error_of(resp).await);
    }
    resp.json::<T>().await.map_err(|e| format!("Parse error: {e}"))
}

// ── Tasks ────────────────────────────────────────────────────────────────────

pub async fn fetch_tasks(filters: &TaskFilters) -> Result<TaskPage, String> {
    let query = filters.to_query();
    let url = if query.is_empty() {
        format!("{API_BASE}/tasks")
    } else {
        format!("{API_BASE}/tasks?{query}")
    };
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;
    read_json(resp).await
}

pub async fn create_task(draft: &TaskDraft) -> Result<Task, String> {
    let resp = Request::post(&format!("{API_BASE}/tasks"))
        .json(draft)
        .map_err(|e| format!("Serialize error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;
    read_json(resp).await
}

pub async fn update_task(id: &str, patch: &TaskDraft) -> Result<Task, String> {
    let resp = Request::put(&format!("{API_BASE}/tasks/{id}"))
        .json(patch)
        .map_err(|e| format!("Serialize error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;
    read_json(resp).await
}

/// Resolves to the deleted id so the cache can drop it.
pub async fn delete_task(id: &str) -> Result<String, String> {
    let resp = Request::delete(&format!("{API_BASE}/tasks/{id}"))
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;
    if !resp.ok() {
        return Err(error_of(resp).await);
    }
    Ok(id.to_string())
}

// ── Chat ─────────────────────────────────────────────────────────────────────

/// Fetches the list of all conversations from the backend.
pub async fn fetch_conversations() -> Result<Vec<Conversation>, String> {
    let resp = Request::get(&format!("{API_BASE}/conversations"))
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;
    read_json(resp).await
}

/// Fetches all messages for a given conversation.
pub async fn fetch_messages(conversation_id: &str) -> Result<Vec<Message>, String> {
    let resp = Request::get(&format!("{API_BASE}/messages/{conversation_id}"))
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;
    read_json(resp).await
}

pub async fn send_chat(
    message: &str,
    conversation_id: Option<&str>,
    model: Option<&str>,
) -> Result<ChatResponse, String> {
    let body = ChatRequest {
        conversation_id: conversation_id.map(str::to_string),
        message: message.to_string(),
        model: model.map(str::to_string),
    };

    let resp = Request::post(&format!("{API_BASE}/chat"))
        .json(&body)
        .map_err(|e| format!("Serialize error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;
    read_json(resp).await
}
