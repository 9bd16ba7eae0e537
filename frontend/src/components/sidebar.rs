use leptos::prelude::*;

use crate::state::AppStore;

/// Sidebar showing conversation list and "New Chat" button.
#[component]
pub fn Sidebar() -> impl IntoView {
    let store = expect_context::<AppStore>();

    let on_new = move |_| store.start_new_conversation();

    view! {
        <aside class="sidebar">
            <div class="sidebar-header">
                <h2>"Conversations"</h2>
                <button class="new-chat-btn" on:click=on_new>
                    "+ New Chat"
                </button>
            </div>
            <div class="conversation-list">
                {move || {
                    if store.chat.with(|c| c.conversations.is_empty()) {
                        view! {
                            <div class="empty-state">"No conversations yet"</div>
                        }.into_any()
                    } else {
                        view! {
                            <For
                                each=move || store.chat.with(|c| c.conversations.clone())
                                key=|c| (c.id.clone(), c.updated_at.clone())
                                let:conv
                            >
                                {
                                    let id_click = conv.id.clone();
                                    let id_active = conv.id.clone();
                                    view! {
                                        <div
                                            class="conversation-item"
                                            class:active=move || {
                                                store.chat.with(|c| {
                                                    c.active_conversation_id.as_deref() == Some(id_active.as_str())
                                                })
                                            }
                                            on:click=move |_| {
                                                store.select_conversation(id_click.clone());
                                            }
                                        >
                                            {conv.title.clone()}
                                        </div>
                                    }
                                }
                            </For>
                        }.into_any()
                    }
                }}
            </div>
        </aside>
    }
}
