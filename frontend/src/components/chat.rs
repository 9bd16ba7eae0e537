use leptos::ev;
use leptos::prelude::*;

use crate::state::AppStore;

/// Main chat area with message history and input.
#[component]
pub fn ChatArea() -> impl IntoView {
    let store = expect_context::<AppStore>();

    view! {
        <main class="chat-area">
            // Error banner
            {move || {
                store.chat.with(|c| c.error.clone()).map(|err| {
                    view! {
                        <div class="error-banner">{err}</div>
                    }
                })
            }}

            <div class="chat-header">
                {move || {
                    store.chat.with(|c| {
                        let active = c.active_conversation_id.as_ref();
                        match active.and_then(|id| c.conversations.iter().find(|conv| &conv.id == id)) {
                            Some(conv) => conv.title.clone(),
                            None if active.is_some() => "Conversation".to_string(),
                            None => "New conversation".to_string(),
                        }
                    })
                }}
            </div>

            <div class="messages-container">
                {move || {
                    if store.active_messages().is_empty() {
                        view! {
                            <div class="empty-state">
                                "Send a message to start chatting"
                            </div>
                        }.into_any()
                    } else {
                        view! {
                            <For
                                each=move || store.active_messages()
                                key=|m| m.id.clone()
                                let:msg
                            >
                                <MessageBubble role=msg.role.clone() content=msg.content.clone() />
                            </For>
                        }.into_any()
                    }
                }}
                {move || {
                    store.chat.with(|c| c.loading).then(|| {
                        view! { <div class="message assistant typing">"…"</div> }
                    })
                }}
            </div>

            <ChatInput />
        </main>
    }
}

/// A single chat message bubble.
#[component]
fn MessageBubble(role: String, content: String) -> impl IntoView {
    let css_class = if role == "user" {
        "message user"
    } else {
        "message assistant"
    };

    view! {
        <div class=css_class>
            <div class="role-label">{role}</div>
            <div>{content}</div>
        </div>
    }
}

/// Chat input form with textarea and send button.
#[component]
fn ChatInput() -> impl IntoView {
    let store = expect_context::<AppStore>();
    let (input, set_input) = signal(String::new());

    let is_sending = move || store.chat.with(|c| c.loading);

    let send = move || {
        let text = input.get_untracked().trim().to_string();
        if text.is_empty() || is_sending() {
            return;
        }
        set_input.set(String::new());
        store.send_message(text);
    };

    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            send();
        }
    };

    view! {
        <div class="input-area">
            <div class="input-row">
                <textarea
                    rows="1"
                    placeholder="Type a message… (Enter to send, Shift+Enter for newline)"
                    prop:value=input
                    on:input=move |ev| {
                        set_input.set(event_target_value(&ev));
                    }
                    on:keydown=on_keydown
                    disabled=is_sending
                />
                <button
                    class="send-btn"
                    on:click=move |_| send()
                    disabled=move || is_sending() || input.get().trim().is_empty()
                >
                    {move || if is_sending() { "Sending…" } else { "Send" }}
                </button>
            </div>
        </div>
    }
}
