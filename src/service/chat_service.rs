use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::agent::ChatAgent;
use crate::db::{ConversationRepository, MessageRepository};
use crate::errors::AppError;
use crate::models::{ChatRequest, ChatResponse, Conversation, Message, MessageRole};

const MAX_MESSAGE_LENGTH: usize = 8000;

#[derive(Clone)]
pub struct ChatService {
    conversation_repo: Arc<dyn ConversationRepository>,
    message_repo: Arc<dyn MessageRepository>,
    agent: Arc<dyn ChatAgent>,
}

impl ChatService {
    pub fn new(
        conversation_repo: Arc<dyn ConversationRepository>,
        message_repo: Arc<dyn MessageRepository>,
        agent: Arc<dyn ChatAgent>,
    ) -> Self {
        Self { conversation_repo, message_repo, agent }
    }

    pub async fn get_conversations(&self) -> Result<Vec<Conversation>, AppError> {
        self.conversation_repo.find_all().await
    }

    pub async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>, AppError> {
        self.require_conversation(conversation_id).await?;
        self.message_repo.find_by_conversation_id(conversation_id).await
    }

    async fn require_conversation(&self, id: &str) -> Result<Conversation, AppError> {
        self.conversation_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation", id))
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AppError> {
        // ── Validation ────────────────────────────────────────────────────────
        if request.message.trim().is_empty() {
            return Err(AppError::EmptyField { field_name: "message".to_string() });
        }
        if request.message.len() > MAX_MESSAGE_LENGTH {
            return Err(AppError::FieldTooLong {
                field_name: "message".to_string(),
                max_length: MAX_MESSAGE_LENGTH,
                actual_length: request.message.len(),
            });
        }

        // ── Resolve or create conversation ────────────────────────────────────
        let conversation = match request.conversation_id.as_deref() {
            Some(id) => self.require_conversation(id).await?,
            None => {
                let conversation = Conversation::new(
                    Uuid::new_v4().to_string(),
                    Conversation::title_from_message(&request.message),
                );
                let saved = self.conversation_repo.save(&conversation).await?;
                info!("Started conversation {}", saved.id);
                saved
            }
        };

        // ── History, then persist the user message ────────────────────────────
        let history = self.message_repo.find_by_conversation_id(&conversation.id).await?;
        let user_message =
            Message::new(conversation.id.clone(), MessageRole::User, request.message.clone());
        self.message_repo.save(&user_message).await?;

        // ── Ask the agent ─────────────────────────────────────────────────────
        let reply = self
            .agent
            .reply(request.model.as_deref(), &history, &request.message)
            .await?;

        // ── Persist assistant reply & bump conversation timestamp ─────────────
        let assistant_message =
            Message::new(conversation.id.clone(), MessageRole::Assistant, reply);
        self.message_repo.save(&assistant_message).await?;
        if let Err(e) = self.conversation_repo.update_timestamp(&conversation.id).await {
            error!("Failed to update conversation timestamp: {e}");
        }

        Ok(ChatResponse {
            conversation_id: conversation.id,
            assistant_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::db::{MemoryConversationRepository, MemoryMessageRepository};

    /// Replies with the user's text reversed and records the history length
    /// it was given.
    #[derive(Default)]
    struct MirrorAgent {
        seen_history: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl ChatAgent for MirrorAgent {
        async fn reply(
            &self,
            _model: Option<&str>,
            history: &[Message],
            user_message: &str,
        ) -> Result<String, AppError> {
            self.seen_history.lock().unwrap().push(history.len());
            Ok(user_message.chars().rev().collect())
        }
    }

    struct DownAgent;

    #[async_trait]
    impl ChatAgent for DownAgent {
        async fn reply(&self, _: Option<&str>, _: &[Message], _: &str) -> Result<String, AppError> {
            Err(AppError::AgentUnavailable { host: "http://localhost:11434".into() })
        }
    }

    fn service_with(agent: Arc<dyn ChatAgent>) -> ChatService {
        ChatService::new(
            Arc::new(MemoryConversationRepository::new()),
            Arc::new(MemoryMessageRepository::new()),
            agent,
        )
    }

    fn request(conversation_id: Option<&str>, message: &str) -> ChatRequest {
        ChatRequest {
            conversation_id: conversation_id.map(str::to_string),
            message: message.to_string(),
            model: None,
        }
    }

    #[tokio::test]
    async fn first_message_mints_a_conversation() {
        let svc = service_with(Arc::new(MirrorAgent::default()));
        let response = svc.chat(request(None, "hello")).await.unwrap();
        assert_eq!(response.assistant_message.content, "olleh");
        assert_eq!(response.assistant_message.role, MessageRole::Assistant);

        let thread = svc.get_messages(&response.conversation_id).await.unwrap();
        let turns: Vec<(MessageRole, &str)> =
            thread.iter().map(|m| (m.role, m.content.as_str())).collect();
        assert_eq!(turns, vec![(MessageRole::User, "hello"), (MessageRole::Assistant, "olleh")]);

        let conversations = svc.get_conversations().await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].title, "hello");
    }

    #[tokio::test]
    async fn follow_up_replays_prior_turns() {
        let agent = Arc::new(MirrorAgent::default());
        let svc = service_with(agent.clone());
        let first = svc.chat(request(None, "one")).await.unwrap();
        svc.chat(request(Some(&first.conversation_id), "two")).await.unwrap();

        assert_eq!(*agent.seen_history.lock().unwrap(), vec![0, 2]);
        assert_eq!(svc.get_messages(&first.conversation_id).await.unwrap().len(), 4);
        assert_eq!(svc.get_conversations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let svc = service_with(Arc::new(MirrorAgent::default()));
        assert!(svc.chat(request(Some("missing"), "hi")).await.unwrap_err().is_not_found());
        assert!(svc.get_messages("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn blank_and_oversized_messages_are_rejected() {
        let svc = service_with(Arc::new(MirrorAgent::default()));
        assert!(matches!(
            svc.chat(request(None, "   ")).await,
            Err(AppError::EmptyField { .. })
        ));
        let huge = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(matches!(
            svc.chat(request(None, &huge)).await,
            Err(AppError::FieldTooLong { .. })
        ));
        assert!(svc.get_conversations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn agent_failure_keeps_the_user_message() {
        let svc = service_with(Arc::new(DownAgent));
        let err = svc.chat(request(None, "anyone there?")).await.unwrap_err();
        assert!(err.is_agent_unavailable());

        let conversations = svc.get_conversations().await.unwrap();
        let thread = svc.get_messages(&conversations[0].id).await.unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].role, MessageRole::User);
    }
}
