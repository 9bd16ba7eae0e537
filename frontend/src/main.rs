mod api;
mod cache;
mod components;
mod models;
mod state;

use leptos::mount::mount_to_body;
use leptos::prelude::*;

use components::chat::ChatArea;
use components::sidebar::Sidebar;
use components::tasks::TaskBoard;
use state::AppStore;

#[derive(Clone, Copy, PartialEq)]
enum Tab {
    Tasks,
    Chat,
}

/// Root application component. Owns the store for the lifetime of the page.
#[component]
fn App() -> impl IntoView {
    let store = AppStore::provide();
    let (tab, set_tab) = signal(Tab::Tasks);

    store.load_tasks();
    store.load_conversations();

    view! {
        <nav class="top-nav">
            <button
                class:active=move || tab.get() == Tab::Tasks
                on:click=move |_| set_tab.set(Tab::Tasks)
            >
                "Tasks"
            </button>
            <button
                class:active=move || tab.get() == Tab::Chat
                on:click=move |_| set_tab.set(Tab::Chat)
            >
                "Chat"
            </button>
        </nav>
        {move || match tab.get() {
            Tab::Tasks => view! { <TaskBoard /> }.into_any(),
            Tab::Chat => view! {
                <div class="app-container">
                    <Sidebar />
                    <ChatArea />
                </div>
            }
            .into_any(),
        }}
    }
}

fn main() {
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::error_1(&format!("Failed to init logger: {e}").into());
    }
    mount_to_body(App);
}
