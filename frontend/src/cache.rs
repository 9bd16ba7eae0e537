//! Client-side mirror of server state.
//!
//! Every change goes through a pure reducer: `(state, action) -> state`.
//! Mutations are confirm-then-apply: nothing is written into the cache until
//! the server has answered, and the server's record always wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::models::{ChatResponse, Conversation, Message, Task, TaskPage};

/// Where an asynchronous operation currently stands.
#[derive(Clone, Debug, PartialEq)]
pub enum Phase<T> {
    Pending,
    Fulfilled(T),
    /// Carries the server's `error` message.
    Rejected(String),
}

// ── Tasks ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum TaskAction {
    Fetch(Phase<TaskPage>),
    Create(Phase<Task>),
    Update(Phase<Task>),
    /// Fulfilled with the deleted id.
    Delete(Phase<String>),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TasksState {
    pub items: Vec<Task>,
    pub page: PageMeta,
    pub loading: bool,
    pub error: Option<String>,
}

/// Replaces the record with the same id, or appends it when absent.
/// Returns `true` when the record was new.
fn merge_or_insert<T>(items: &mut Vec<T>, record: T, id_of: impl Fn(&T) -> &str) -> bool {
    match items.iter_mut().find(|existing| id_of(existing) == id_of(&record)) {
        Some(slot) => {
            *slot = record;
            false
        }
        None => {
            items.push(record);
            true
        }
    }
}

fn settle<T>(loading: &mut bool, error: &mut Option<String>, phase: Phase<T>) -> Option<T> {
    match phase {
        Phase::Pending => {
            *loading = true;
            *error = None;
            None
        }
        Phase::Rejected(message) => {
            *loading = false;
            *error = Some(message);
            None
        }
        Phase::Fulfilled(value) => {
            *loading = false;
            Some(value)
        }
    }
}

pub fn reduce_tasks(mut state: TasksState, action: TaskAction) -> TasksState {
    match action {
        TaskAction::Fetch(phase) => {
            if let Some(page) = settle(&mut state.loading, &mut state.error, phase) {
                state.page = PageMeta {
                    page: page.page,
                    limit: page.limit,
                    total: page.total,
                    pages: page.pages,
                };
                state.items = page.items;
            }
        }
        TaskAction::Create(phase) | TaskAction::Update(phase) => {
            if let Some(task) = settle(&mut state.loading, &mut state.error, phase) {
                if merge_or_insert(&mut state.items, task, |t| &t.id) {
                    state.page.total += 1;
                }
            }
        }
        TaskAction::Delete(phase) => {
            if let Some(id) = settle(&mut state.loading, &mut state.error, phase) {
                let before = state.items.len();
                state.items.retain(|t| t.id != id);
                if state.items.len() < before {
                    state.page.total = state.page.total.saturating_sub(1);
                }
            }
        }
    }
    state
}

// ── Chat ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum ChatAction {
    FetchConversations(Phase<Vec<Conversation>>),
    FetchMessages { conversation_id: String, phase: Phase<Vec<Message>> },
    Send(Phase<ChatResponse>),
    /// `None` clears the selection so the next send starts a new conversation.
    Select(Option<String>),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatState {
    pub conversations: Vec<Conversation>,
    pub messages_by_conversation: HashMap<String, Vec<Message>>,
    pub active_conversation_id: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ChatState {
    pub fn active_messages(&self) -> &[Message] {
        self.active_conversation_id
            .as_ref()
            .and_then(|id| self.messages_by_conversation.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub fn reduce_chat(mut state: ChatState, action: ChatAction) -> ChatState {
    match action {
        ChatAction::FetchConversations(phase) => {
            if let Some(conversations) = settle(&mut state.loading, &mut state.error, phase) {
                state.conversations = conversations;
            }
        }
        ChatAction::FetchMessages { conversation_id, phase } => {
            if let Some(messages) = settle(&mut state.loading, &mut state.error, phase) {
                state.messages_by_conversation.insert(conversation_id, messages);
            }
        }
        ChatAction::Send(phase) => {
            if let Some(resp) = settle(&mut state.loading, &mut state.error, phase) {
                let thread = state
                    .messages_by_conversation
                    .entry(resp.conversation_id.clone())
                    .or_default();
                merge_or_insert(thread, resp.assistant_message, |m| &m.id);
                state.active_conversation_id = Some(resp.conversation_id);
            }
        }
        ChatAction::Select(conversation_id) => {
            state.active_conversation_id = conversation_id;
            state.loading = false;
            state.error = None;
        }
    }
    state
}

// ── Operation lifecycle ──────────────────────────────────────────────────────

/// Ticket held by one in-flight request. Once it is no longer live the
/// request's result must be discarded.
#[derive(Clone, Debug)]
pub struct OperationHandle {
    token: CancellationToken,
}

impl OperationHandle {
    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }
}

/// Hands out [`OperationHandle`]s tied to the store's lifetime.
///
/// Plain operations die only at [`Lifecycle::teardown`]. Operations begun in
/// a named slot also die when a newer operation takes the same slot.
#[derive(Clone, Debug, Default)]
pub struct Lifecycle {
    root: CancellationToken,
    slots: Arc<Mutex<HashMap<&'static str, CancellationToken>>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<&'static str, CancellationToken>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn begin(&self) -> OperationHandle {
        OperationHandle { token: self.root.child_token() }
    }

    /// Begins an operation that supersedes whatever previously held `slot`.
    pub fn begin_exclusive(&self, slot: &'static str) -> OperationHandle {
        let token = self.root.child_token();
        if let Some(previous) = self.slots().insert(slot, token.clone()) {
            previous.cancel();
        }
        OperationHandle { token }
    }

    /// Invalidates every outstanding handle in `slot` without starting a new one.
    pub fn release(&self, slot: &'static str) {
        if let Some(previous) = self.slots().remove(slot) {
            previous.cancel();
        }
    }

    pub fn teardown(&self) {
        self.root.cancel();
        self.slots().clear();
    }

    pub fn is_torn_down(&self) -> bool {
        self.root.is_cancelled()
    }
}
