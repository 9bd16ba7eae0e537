use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::cache::{
    reduce_chat, reduce_tasks, ChatAction, ChatState, Lifecycle, OperationHandle, Phase,
    TaskAction, TasksState,
};
use crate::models::{Message, TaskDraft, TaskFilters};

const THREAD_SLOT: &str = "thread";
const TASK_LIST_SLOT: &str = "task-list";

/// Application store, provided via Leptos context.
///
/// Created once by the root component; its operations are cancelled when
/// that component is cleaned up, after which late responses are dropped.
#[derive(Clone, Copy)]
pub struct AppStore {
    pub tasks: RwSignal<TasksState>,
    pub chat: RwSignal<ChatState>,
    pub filters: RwSignal<TaskFilters>,
    lifecycle: StoredValue<Lifecycle>,
}

impl AppStore {
    /// Create a new store, provide it in the current context and tie its
    /// lifetime to the current owner.
    pub fn provide() -> Self {
        let lifecycle = Lifecycle::new();
        let store = Self {
            tasks: RwSignal::new(TasksState::default()),
            chat: RwSignal::new(ChatState::default()),
            filters: RwSignal::new(TaskFilters { limit: 10, ..Default::default() }),
            lifecycle: StoredValue::new(lifecycle.clone()),
        };

        on_cleanup(move || {
            log::debug!("Tearing down app store");
            lifecycle.teardown();
        });

        provide_context(store);
        store
    }

    fn dispatch_tasks(&self, action: TaskAction) {
        self.tasks.update(|state| *state = reduce_tasks(std::mem::take(state), action));
    }

    fn dispatch_chat(&self, action: ChatAction) {
        self.chat.update(|state| *state = reduce_chat(std::mem::take(state), action));
    }

    /// Applies a settled result only if its operation is still live.
    fn settle_tasks(&self, handle: &OperationHandle, action: TaskAction) {
        if handle.is_live() {
            self.dispatch_tasks(action);
        } else {
            log::debug!("Discarding stale task result");
        }
    }

    fn settle_chat(&self, handle: &OperationHandle, action: ChatAction) {
        if handle.is_live() {
            self.dispatch_chat(action);
        } else {
            log::debug!("Discarding stale chat result");
        }
    }

    // ── Tasks ────────────────────────────────────────────────────────────────

    /// Fetch the current page under the current filters. A newer fetch
    /// supersedes an older one still in flight.
    pub fn load_tasks(&self) {
        let store = *self;
        let handle = self.lifecycle.with_value(|l| l.begin_exclusive(TASK_LIST_SLOT));
        let filters = self.filters.get_untracked();
        self.dispatch_tasks(TaskAction::Fetch(Phase::Pending));

        spawn_local(async move {
            let phase = match api::fetch_tasks(&filters).await {
                Ok(page) => Phase::Fulfilled(page),
                Err(e) => {
                    log::error!("Failed to fetch tasks: {e}");
                    Phase::Rejected(e)
                }
            };
            store.settle_tasks(&handle, TaskAction::Fetch(phase));
        });
    }

    /// Replace the filters and refetch from the first page.
    pub fn apply_filters(&self, filters: TaskFilters) {
        self.filters.set(TaskFilters { page: 1, ..filters });
        self.load_tasks();
    }

    pub fn go_to_page(&self, page: u32) {
        self.filters.update(|f| f.page = page.max(1));
        self.load_tasks();
    }

    pub fn create_task(&self, draft: TaskDraft) {
        let store = *self;
        let handle = self.lifecycle.with_value(Lifecycle::begin);
        self.dispatch_tasks(TaskAction::Create(Phase::Pending));

        spawn_local(async move {
            let phase = match api::create_task(&draft).await {
                Ok(task) => Phase::Fulfilled(task),
                Err(e) => Phase::Rejected(e),
            };
            store.settle_tasks(&handle, TaskAction::Create(phase));
        });
    }

    pub fn update_task(&self, id: String, patch: TaskDraft) {
        let store = *self;
        let handle = self.lifecycle.with_value(Lifecycle::begin);
        self.dispatch_tasks(TaskAction::Update(Phase::Pending));

        spawn_local(async move {
            let phase = match api::update_task(&id, &patch).await {
                Ok(task) => Phase::Fulfilled(task),
                Err(e) => Phase::Rejected(e),
            };
            store.settle_tasks(&handle, TaskAction::Update(phase));
        });
    }

    pub fn delete_task(&self, id: String) {
        let store = *self;
        let handle = self.lifecycle.with_value(Lifecycle::begin);
        self.dispatch_tasks(TaskAction::Delete(Phase::Pending));

        spawn_local(async move {
            let phase = match api::delete_task(&id).await {
                Ok(deleted) => Phase::Fulfilled(deleted),
                Err(e) => Phase::Rejected(e),
            };
            store.settle_tasks(&handle, TaskAction::Delete(phase));
        });
    }

    // ── Chat ─────────────────────────────────────────────────────────────────

    /// Load conversations from the backend.
    pub fn load_conversations(&self) {
        let store = *self;
        let handle = self.lifecycle.with_value(Lifecycle::begin);
        self.dispatch_chat(ChatAction::FetchConversations(Phase::Pending));

        spawn_local(async move {
            let phase = match api::fetch_conversations().await {
                Ok(convos) => Phase::Fulfilled(convos),
                Err(e) => {
                    log::error!("Failed to fetch conversations: {e}");
                    Phase::Rejected(e)
                }
            };
            store.settle_chat(&handle, ChatAction::FetchConversations(phase));
        });
    }

    /// Select a conversation and load its messages. Selecting another one
    /// before this resolves discards this result.
    pub fn select_conversation(&self, id: String) {
        self.dispatch_chat(ChatAction::Select(Some(id.clone())));
        self.fetch_thread(id);
    }

    /// Clear the selection so the next message opens a new conversation.
    pub fn start_new_conversation(&self) {
        self.lifecycle.with_value(|l| l.release(THREAD_SLOT));
        self.dispatch_chat(ChatAction::Select(None));
    }

    fn fetch_thread(&self, id: String) {
        let store = *self;
        let handle = self.lifecycle.with_value(|l| l.begin_exclusive(THREAD_SLOT));
        self.dispatch_chat(ChatAction::FetchMessages {
            conversation_id: id.clone(),
            phase: Phase::Pending,
        });

        spawn_local(async move {
            let phase = match api::fetch_messages(&id).await {
                Ok(msgs) => Phase::Fulfilled(msgs),
                Err(e) => {
                    log::error!("Failed to fetch messages: {e}");
                    Phase::Rejected(e)
                }
            };
            store.settle_chat(&handle, ChatAction::FetchMessages { conversation_id: id, phase });
        });
    }

    /// Send a message in the active conversation (or a new one), then
    /// re-fetch the thread and the conversation list.
    pub fn send_message(&self, text: String) {
        let store = *self;
        let handle = self.lifecycle.with_value(|l| l.begin_exclusive(THREAD_SLOT));
        let conv_id = self.chat.with_untracked(|c| c.active_conversation_id.clone());
        self.dispatch_chat(ChatAction::Send(Phase::Pending));

        spawn_local(async move {
            match api::send_chat(&text, conv_id.as_deref(), None).await {
                Ok(resp) => {
                    if !handle.is_live() {
                        log::debug!("Discarding reply for superseded conversation");
                        return;
                    }
                    let conversation_id = resp.conversation_id.clone();
                    store.dispatch_chat(ChatAction::Send(Phase::Fulfilled(resp)));
                    store.fetch_thread(conversation_id);
                    store.load_conversations();
                }
                Err(e) => {
                    log::error!("Chat request failed: {e}");
                    store.settle_chat(&handle, ChatAction::Send(Phase::Rejected(e)));
                }
            }
        });
    }

    /// Messages of the active conversation; tracks the chat signal.
    pub fn active_messages(&self) -> Vec<Message> {
        self.chat.with(|c| c.active_messages().to_vec())
    }
}
