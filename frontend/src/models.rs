use serde::{Deserialize, Serialize};

/// Matches the backend `Task` model (camelCase on the wire).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    pub priority: String,
    pub due_date: String,
    pub category: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One page of `GET /api/tasks`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TaskPage {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
    pub items: Vec<Task>,
}

/// Body for create and partial update. Unset fields are not sent, so an
/// update leaves them untouched.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Listing parameters; empty strings are treated as unset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskFilters {
    pub status: String,
    pub priority: String,
    pub category: String,
    pub q: String,
    pub sort: String,
    /// Inclusive `YYYY-MM-DD` bounds on the due date.
    pub due_from: String,
    pub due_to: String,
    pub page: u32,
    pub limit: u32,
}

impl TaskFilters {
    /// Renders the filters as a query string (without the leading `?`).
    pub fn to_query(&self) -> String {
        let mut pairs: Vec<String> = [
            ("status", &self.status),
            ("priority", &self.priority),
            ("category", &self.category),
            ("q", &self.q),
            ("sort", &self.sort),
            ("dueFrom", &self.due_from),
            ("dueTo", &self.due_to),
        ]
        .into_iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v.trim())))
        .collect();
        if self.page > 0 {
            pairs.push(format!("page={}", self.page));
        }
        if self.limit > 0 {
            pairs.push(format!("limit={}", self.limit));
        }
        pairs.join("&")
    }
}

/// Matches the backend `Conversation` model.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Matches the backend `Message` model.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

/// Request body for `POST /api/chat`. A `None` id starts a new conversation.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub conversation_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub assistant_message: Message,
}

/// Error body returned by every failing endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(default)]
    pub details: Vec<String>,
}
