use async_trait::async_trait;
use rig::client::Nothing;
use rig::completion::Chat;
use rig::message::Message as RigMessage;
use rig::prelude::CompletionClient;
use rig::providers::ollama;
use tracing::{debug, error};

use crate::errors::AppError;
use crate::models::{Message, MessageRole};

pub const DEFAULT_MODEL: &str = "llama3.2";
/// How many prior messages are replayed to the model.
pub const MAX_HISTORY: usize = 16;

const PREAMBLE: &str = "You are a helpful AI assistant running locally via Ollama. \
                        Be concise, accurate, and friendly. \
                        If you don't know something, say so.";

/// The language model behind `/api/chat`. Only the request/response
/// contract matters to the rest of the crate.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Produces the assistant's reply to `user_message` given prior turns.
    /// `model` overrides the agent's default model when set.
    async fn reply(
        &self,
        model: Option<&str>,
        history: &[Message],
        user_message: &str,
    ) -> Result<String, AppError>;
}

/// Builds the rig history from stored messages, keeping the last
/// [`MAX_HISTORY`] turns.
fn to_rig_history(messages: &[Message]) -> Vec<RigMessage> {
    let start = messages.len().saturating_sub(MAX_HISTORY);
    messages[start..]
        .iter()
        .map(|m| match m.role {
            MessageRole::User => RigMessage::user(&m.content),
            MessageRole::Assistant => RigMessage::assistant(&m.content),
        })
        .collect()
}

/// [`ChatAgent`] backed by a local Ollama server through rig.
/// A fresh rig agent is built per request and the history replayed from
/// storage each time.
#[derive(Clone)]
pub struct OllamaAgentService {
    client: ollama::Client,
    base_url: String,
    model: String,
}

impl OllamaAgentService {
    pub fn new(base_url: &str, model: &str) -> Result<Self, AppError> {
        let client = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(base_url)
            .build()
            .map_err(|e| AppError::Unexpected(format!("Failed to build Ollama client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ChatAgent for OllamaAgentService {
    async fn reply(
        &self,
        model: Option<&str>,
        history: &[Message],
        user_message: &str,
    ) -> Result<String, AppError> {
        let model = model.filter(|m| !m.trim().is_empty()).unwrap_or(&self.model);
        let agent = self.client.agent(model).preamble(PREAMBLE).build();
        let rig_history = to_rig_history(history);
        debug!("Sending chat turn to {model} with {} history messages", rig_history.len());

        agent.chat(user_message, rig_history).await.map_err(|e| {
            error!("Ollama inference failed with model {model}: {e}");
            let msg = e.to_string();
            if msg.contains("Connection refused") || msg.contains("connect") {
                AppError::AgentUnavailable { host: self.base_url.clone() }
            } else if msg.contains("model") {
                AppError::ModelNotFound { model_name: model.to_string() }
            } else {
                AppError::AgentFailed { message: msg }
            }
        })
    }
}
