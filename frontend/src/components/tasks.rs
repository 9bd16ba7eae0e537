use leptos::ev;
use leptos::prelude::*;

use crate::models::{Task, TaskDraft, TaskFilters};
use crate::state::AppStore;

const STATUSES: [&str; 3] = ["pending", "in-progress", "completed"];
const PRIORITIES: [&str; 3] = ["low", "medium", "high"];
const CATEGORIES: [&str; 5] = ["Work", "Personal", "Shopping", "Health", "Other"];
const SORTS: [(&str, &str); 6] = [
    ("-createdAt", "Newest"),
    ("createdAt", "Oldest"),
    ("dueDate", "Due soonest"),
    ("-dueDate", "Due latest"),
    ("-priority", "Priority"),
    ("title", "Title"),
];

/// Task board: filters, creation form, list and pager.
#[component]
pub fn TaskBoard() -> impl IntoView {
    let store = expect_context::<AppStore>();

    view! {
        <main class="task-board">
            {move || {
                store.tasks.with(|t| t.error.clone()).map(|err| {
                    view! { <div class="error-banner">{err}</div> }
                })
            }}
            <TaskFilterBar />
            <TaskForm />
            <TaskList />
            <Pager />
        </main>
    }
}

/// A `<select>` with a leading "any" option bound to `value`.
#[component]
fn Choice(
    label: &'static str,
    options: Vec<(&'static str, &'static str)>,
    value: RwSignal<String>,
) -> impl IntoView {
    view! {
        <label class="choice">
            {label}
            <select
                prop:value=move || value.get()
                on:change=move |ev| value.set(event_target_value(&ev))
            >
                <option value="">"Any"</option>
                {options
                    .into_iter()
                    .map(|(v, text)| view! { <option value=v>{text}</option> })
                    .collect_view()}
            </select>
        </label>
    }
}

fn same(values: &[&'static str]) -> Vec<(&'static str, &'static str)> {
    values.iter().map(|v| (*v, *v)).collect()
}

#[component]
fn TaskFilterBar() -> impl IntoView {
    let store = expect_context::<AppStore>();
    let current = store.filters.get_untracked();

    let status = RwSignal::new(current.status);
    let priority = RwSignal::new(current.priority);
    let category = RwSignal::new(current.category);
    let sort = RwSignal::new(current.sort);
    let q = RwSignal::new(current.q);
    let due_from = RwSignal::new(current.due_from);
    let due_to = RwSignal::new(current.due_to);

    let apply = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let limit = store.filters.with_untracked(|f| f.limit);
        store.apply_filters(TaskFilters {
            status: status.get_untracked(),
            priority: priority.get_untracked(),
            category: category.get_untracked(),
            q: q.get_untracked(),
            sort: sort.get_untracked(),
            due_from: due_from.get_untracked(),
            due_to: due_to.get_untracked(),
            page: 1,
            limit,
        });
    };

    view! {
        <form class="filter-bar" on:submit=apply>
            <Choice label="Status" options=same(&STATUSES) value=status />
            <Choice label="Priority" options=same(&PRIORITIES) value=priority />
            <Choice label="Category" options=same(&CATEGORIES) value=category />
            <Choice label="Sort" options=SORTS.to_vec() value=sort />
            <input
                type="search"
                placeholder="Search title or description"
                prop:value=move || q.get()
                on:input=move |ev| q.set(event_target_value(&ev))
            />
            <label class="choice">
                "Due from"
                <input
                    type="date"
                    prop:value=move || due_from.get()
                    on:input=move |ev| due_from.set(event_target_value(&ev))
                />
            </label>
            <label class="choice">
                "Due to"
                <input
                    type="date"
                    prop:value=move || due_to.get()
                    on:input=move |ev| due_to.set(event_target_value(&ev))
                />
            </label>
            <button type="submit">"Apply"</button>
        </form>
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Creation form. Validation happens on the server; its message is shown
/// in the board's error banner.
#[component]
fn TaskForm() -> impl IntoView {
    let store = expect_context::<AppStore>();
    let title = RwSignal::new(String::new());
    let description = RwSignal::new(String::new());
    let due_date = RwSignal::new(String::new());
    let category = RwSignal::new(String::new());
    let priority = RwSignal::new(String::new());

    let submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        store.create_task(TaskDraft {
            title: Some(title.get_untracked()),
            description: non_empty(description.get_untracked()),
            status: None,
            priority: non_empty(priority.get_untracked()),
            due_date: non_empty(due_date.get_untracked()),
            category: non_empty(category.get_untracked()),
        });
        title.set(String::new());
        description.set(String::new());
    };

    view! {
        <form class="task-form" on:submit=submit>
            <input
                placeholder="Title"
                prop:value=move || title.get()
                on:input=move |ev| title.set(event_target_value(&ev))
            />
            <input
                placeholder="Description"
                prop:value=move || description.get()
                on:input=move |ev| description.set(event_target_value(&ev))
            />
            <input
                type="date"
                prop:value=move || due_date.get()
                on:input=move |ev| due_date.set(event_target_value(&ev))
            />
            <Choice label="Category" options=same(&CATEGORIES) value=category />
            <Choice label="Priority" options=same(&PRIORITIES) value=priority />
            <button type="submit" disabled=move || store.tasks.with(|t| t.loading)>
                "Add task"
            </button>
        </form>
    }
}

#[component]
fn TaskList() -> impl IntoView {
    let store = expect_context::<AppStore>();

    view! {
        <ul class="task-list">
            <For
                each=move || store.tasks.with(|t| t.items.clone())
                key=|t| (t.id.clone(), t.updated_at.clone())
                let:task
            >
                <TaskRow task=task />
            </For>
        </ul>
        {move || {
            store.tasks.with(|t| t.items.is_empty() && !t.loading).then(|| {
                view! { <div class="empty-state">"No tasks match"</div> }
            })
        }}
    }
}

#[component]
fn TaskRow(task: Task) -> impl IntoView {
    let store = expect_context::<AppStore>();
    let id_status = task.id.clone();
    let id_delete = task.id.clone();
    let current = task.status.clone();

    let on_status = move |ev: ev::Event| {
        let status = event_target_value(&ev);
        store.update_task(
            id_status.clone(),
            TaskDraft { status: Some(status), ..Default::default() },
        );
    };

    view! {
        <li class=format!("task-item {}", task.status)>
            <div class="task-main">
                <strong>{task.title}</strong>
                <span class="task-meta">
                    {format!("{} · {} · due {}", task.category, task.priority, task.due_date)}
                </span>
                <p>{task.description}</p>
            </div>
            <select on:change=on_status>
                {STATUSES
                    .into_iter()
                    .map(|s| view! { <option value=s selected={s == current}>{s}</option> })
                    .collect_view()}
            </select>
            <button class="delete-btn" on:click=move |_| store.delete_task(id_delete.clone())>
                "Delete"
            </button>
        </li>
    }
}

#[component]
fn Pager() -> impl IntoView {
    let store = expect_context::<AppStore>();
    let page = move || store.tasks.with(|t| t.page.page.max(1));
    let pages = move || store.tasks.with(|t| t.page.pages.max(1));

    view! {
        <div class="pager">
            <button
                disabled=move || page() <= 1
                on:click=move |_| store.go_to_page(page().saturating_sub(1))
            >
                "Prev"
            </button>
            <span>
                {move || {
                    let total = store.tasks.with(|t| t.page.total);
                    format!("Page {} of {} ({} tasks)", page(), pages(), total)
                }}
            </span>
            <button
                disabled=move || u64::from(page()) >= pages()
                on:click=move |_| store.go_to_page(page() + 1)
            >
                "Next"
            </button>
        </div>
    }
}
