pub mod api_routes;
pub mod author_routes;
pub mod book_routes;
pub mod task_routes;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::errors::{AppError, ErrorBody};
use crate::state::AppState;
use api_routes::{chat_handler, list_conversations_handler, list_messages_handler};
use author_routes::{
    author_books_handler, create_author_handler, delete_author_handler, get_author_handler,
    list_authors_handler, update_author_handler,
};
use book_routes::{
    create_book_handler, delete_book_handler, get_book_handler, list_books_handler,
    update_book_handler,
};
use task_routes::{
    create_task_handler, delete_task_handler, get_task_handler, list_tasks_handler,
    update_task_handler,
};

/// Builds the full HTTP surface. CORS is layered on by `main`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/api/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/api/tasks/{id}",
            get(get_task_handler).put(update_task_handler).delete(delete_task_handler),
        )
        .route("/api/authors", get(list_authors_handler).post(create_author_handler))
        .route(
            "/api/authors/{id}",
            get(get_author_handler).put(update_author_handler).delete(delete_author_handler),
        )
        .route("/api/authors/{id}/books", get(author_books_handler))
        .route("/api/books", get(list_books_handler).post(create_book_handler))
        .route(
            "/api/books/{id}",
            get(get_book_handler).put(update_book_handler).delete(delete_book_handler),
        )
        .route("/api/chat", post(chat_handler))
        .route("/api/conversations", get(list_conversations_handler))
        .route("/api/messages/{conversation_id}", get(list_messages_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET `/`: liveness probe
async fn health_handler() -> Json<Value> {
    Json(json!({ "ok": true, "service": env!("CARGO_PKG_NAME") }))
}

async fn not_found_handler() -> (StatusCode, Json<ErrorBody>) {
    let body = ErrorBody { error: "Not found".to_string(), details: Vec::new() };
    (StatusCode::NOT_FOUND, Json(body))
}

/// Unwraps a JSON body, turning a rejection into a 400 with the parser's
/// explanation as the single detail.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(value)| value).map_err(|rejection| AppError::BadRequest {
        message: "Invalid JSON body".to_string(),
        details: vec![rejection.body_text()],
    })
}

/// Unwraps query-string parameters; a string that does not fit the
/// parameter struct becomes a 400 with the same body shape.
pub(crate) fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params.map(|Query(value)| value).map_err(|rejection| AppError::BadRequest {
        message: "Invalid query string".to_string(),
        details: vec![rejection.body_text()],
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    use super::*;
    use crate::agent::ChatAgent;
    use crate::models::Message;

    struct CannedAgent;

    #[async_trait]
    impl ChatAgent for CannedAgent {
        async fn reply(
            &self,
            _model: Option<&str>,
            _history: &[Message],
            user_message: &str,
        ) -> Result<String, AppError> {
            Ok(format!("You said: {user_message}"))
        }
    }

    fn app() -> Router {
        router(AppState::in_memory(Arc::new(CannedAgent)))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn buy_milk() -> Value {
        json!({ "title": "Buy milk", "dueDate": "2025-10-25", "category": "Shopping" })
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (status, body) = send(&app(), Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn create_task_returns_201_with_defaults() {
        let (status, body) = send(&app(), Method::POST, "/api/tasks", Some(buy_milk())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert_eq!(body["status"], "pending");
        assert_eq!(body["priority"], "medium");
        assert_eq!(body["description"], "");
        assert_eq!(body["dueDate"], "2025-10-25");
    }

    #[tokio::test]
    async fn invalid_task_returns_400_with_details() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": "x", "status": "done" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(
            body["details"],
            json!([
                "status must be pending|in-progress|completed",
                "dueDate is required (YYYY-MM-DD)",
                "category is required"
            ])
        );
    }

    #[tokio::test]
    async fn malformed_json_returns_400() {
        let app = app();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/tasks")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Invalid JSON body");
    }

    #[tokio::test]
    async fn repeated_query_key_returns_json_400() {
        let (status, body) =
            send(&app(), Method::GET, "/api/tasks?status=pending&status=completed", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid query string");
        assert_eq!(body["details"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn task_lifecycle_over_http() {
        let app = app();
        let (_, created) = send(&app, Method::POST, "/api/tasks", Some(buy_milk())).await;
        let id = created["id"].as_str().unwrap().to_string();
        let uri = format!("/api/tasks/{id}");

        let (status, fetched) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, updated) =
            send(&app, Method::PUT, &uri, Some(json!({ "status": "completed" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "completed");
        assert_eq!(updated["title"], "Buy milk");
        assert_eq!(updated["createdAt"], created["createdAt"]);

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Task not found");
    }

    #[tokio::test]
    async fn malformed_id_returns_400() {
        let (status, body) = send(&app(), Method::GET, "/api/tasks/123", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid id format");
    }

    #[tokio::test]
    async fn list_filters_and_reports_page_window() {
        let app = app();
        send(&app, Method::POST, "/api/tasks", Some(buy_milk())).await;
        let done = json!({
            "title": "File taxes",
            "dueDate": "2025-04-15",
            "category": "Personal",
            "status": "completed"
        });
        send(&app, Method::POST, "/api/tasks", Some(done)).await;

        let (status, body) =
            send(&app, Method::GET, "/api/tasks?status=completed&page=0&limit=1000", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 1);
        assert_eq!(body["limit"], 100);
        assert_eq!(body["total"], 1);
        assert_eq!(body["pages"], 1);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["title"], "File taxes");

        let (_, body) = send(&app, Method::GET, "/api/tasks?status=archived", None).await;
        assert_eq!(body["error"], "Validation failed");
    }

    async fn create_author(app: &Router, email: &str) -> String {
        let author = json!({ "first_name": "Frank", "last_name": "Herbert", "email": email });
        let (status, body) = send(app, Method::POST, "/api/authors", Some(author)).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    fn dune(author_id: &str) -> Value {
        json!({
            "title": "Dune",
            "isbn": "978-0441013593",
            "publication_year": 1965,
            "author_id": author_id
        })
    }

    #[tokio::test]
    async fn duplicate_isbn_returns_409() {
        let app = app();
        let author_id = create_author(&app, "frank@arrakis.org").await;
        let (status, created) =
            send(&app, Method::POST, "/api/books", Some(dune(&author_id))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["available_copies"], 1);

        let (status, body) = send(&app, Method::POST, "/api/books", Some(dune(&author_id))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "ISBN already exists");
    }

    #[tokio::test]
    async fn book_for_unknown_author_returns_400() {
        let app = app();
        let (status, body) = send(&app, Method::POST, "/api/books", Some(dune("ghost"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Author does not exist");
    }

    #[tokio::test]
    async fn duplicate_author_email_returns_400() {
        let app = app();
        create_author(&app, "frank@arrakis.org").await;
        let again = json!({ "first_name": "F", "last_name": "H", "email": "frank@arrakis.org" });
        let (status, body) = send(&app, Method::POST, "/api/authors", Some(again)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email already registered");
    }

    #[tokio::test]
    async fn author_books_and_delete_guard_over_http() {
        let app = app();
        let author_id = create_author(&app, "frank@arrakis.org").await;
        let (_, book) = send(&app, Method::POST, "/api/books", Some(dune(&author_id))).await;

        let (status, books) =
            send(&app, Method::GET, &format!("/api/authors/{author_id}/books"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(books, json!([book.clone()]));

        let author_uri = format!("/api/authors/{author_id}");
        let (status, body) = send(&app, Method::DELETE, &author_uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot delete author with associated books");

        let book_uri = format!("/api/books/{}", book["id"].as_str().unwrap());
        send(&app, Method::DELETE, &book_uri, None).await;
        let (status, _) = send(&app, Method::DELETE, &author_uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, Method::GET, &author_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Author not found");
    }

    #[tokio::test]
    async fn authors_list_accepts_size() {
        let app = app();
        create_author(&app, "a@example.com").await;
        create_author(&app, "b@example.com").await;
        let (status, body) = send(&app, Method::GET, "/api/authors?page=2&size=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 2);
        assert_eq!(body["limit"], 1);
        assert_eq!(body["total"], 2);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn chat_mints_conversation_and_records_both_turns() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/chat",
            Some(json!({ "conversation_id": null, "message": "hello", "model": "llama3.2" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let conversation_id = body["conversation_id"].as_str().unwrap().to_string();
        assert_eq!(body["assistant_message"]["role"], "assistant");
        assert_eq!(body["assistant_message"]["content"], "You said: hello");

        let (status, thread) =
            send(&app, Method::GET, &format!("/api/messages/{conversation_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let turns: Vec<(&str, &str)> = thread
            .as_array()
            .unwrap()
            .iter()
            .map(|m| (m["role"].as_str().unwrap(), m["content"].as_str().unwrap()))
            .collect();
        assert_eq!(turns, vec![("user", "hello"), ("assistant", "You said: hello")]);

        let (_, conversations) = send(&app, Method::GET, "/api/conversations", None).await;
        assert_eq!(conversations[0]["id"], conversation_id.as_str());
    }

    #[tokio::test]
    async fn unknown_route_returns_json_404() {
        let (status, body) = send(&app(), Method::GET, "/nonexistent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }
}
