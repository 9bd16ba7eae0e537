//! Compiles raw list parameters into a normalized [`QueryPlan`].
//!
//! The plan is storage-agnostic: [`TaskFilter::matches`] and
//! [`SortKey::compare`] serve the in-memory store, while the PostgreSQL
//! repository renders the same plan through `sqlx::QueryBuilder`.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Task, TaskCategory, TaskPriority, TaskStatus};
use crate::validation::parse_date;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Query-string parameters of `GET /api/tasks`, kept as raw strings so that
/// malformed numbers fall back to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQueryParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub due_from: Option<String>,
    pub due_to: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Conjunction of optional predicates over a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<TaskCategory>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    /// Lowercased search term matched against title or description.
    pub text: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if self.category.is_some_and(|c| c != task.category) {
            return false;
        }
        if self.due_from.is_some_and(|from| task.due_date < from) {
            return false;
        }
        if self.due_to.is_some_and(|to| task.due_date > to) {
            return false;
        }
        match &self.text {
            Some(term) => {
                task.title.to_lowercase().contains(term.as_str())
                    || task.description.to_lowercase().contains(term.as_str())
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Description,
    Status,
    Priority,
    DueDate,
    Category,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    const ALL: &'static [SortField] = &[
        SortField::Title,
        SortField::Description,
        SortField::Status,
        SortField::Priority,
        SortField::DueDate,
        SortField::Category,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    /// Name as it appears in the `sort` parameter.
    pub fn param_name(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Description => "description",
            SortField::Status => "status",
            SortField::Priority => "priority",
            SortField::DueDate => "dueDate",
            SortField::Category => "category",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }

    /// Whether the column holds text. Text columns are ordered by byte
    /// value on every backend.
    pub fn is_text(&self) -> bool {
        !matches!(self, SortField::DueDate | SortField::CreatedAt | SortField::UpdatedAt)
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Description => "description",
            SortField::Status => "status",
            SortField::Priority => "priority",
            SortField::DueDate => "due_date",
            SortField::Category => "category",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }

    fn from_param(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.param_name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl Default for SortKey {
    fn default() -> Self {
        Self { field: SortField::CreatedAt, descending: true }
    }
}

impl SortKey {
    /// Parses `field` or `-field`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        SortField::from_param(name)
            .map(|field| SortKey { field, descending })
            .ok_or_else(|| {
                let legal: Vec<&str> = SortField::ALL.iter().map(|f| f.param_name()).collect();
                AppError::validation(vec![format!("sort must be one of {}", legal.join("|"))])
            })
    }

    /// Total order: the requested field, then `id` ascending. Text compares
    /// by byte value, so `"Zebra"` sorts before `"apple"`.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let primary = match self.field {
            SortField::Title => a.title.cmp(&b.title),
            SortField::Description => a.description.cmp(&b.description),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
            SortField::Priority => a.priority.as_str().cmp(b.priority.as_str()),
            SortField::DueDate => a.due_date.cmp(&b.due_date),
            SortField::Category => a.category.as_str().cmp(b.category.as_str()),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        let primary = if self.descending { primary.reverse() } else { primary };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Normalized filter, sort and page window for one list request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub filter: TaskFilter,
    pub sort: SortKey,
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
}

impl Default for QueryPlan {
    fn default() -> Self {
        Self {
            filter: TaskFilter::default(),
            sort: SortKey::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

fn non_blank(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_filter_enum<T: std::str::FromStr>(
    field: &str,
    raw: &Option<String>,
    legal: String,
    violations: &mut Vec<String>,
) -> Option<T> {
    let raw = non_blank(raw)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            violations.push(format!("{field} must be {legal}"));
            None
        }
    }
}

fn parse_filter_date(
    field: &str,
    raw: &Option<String>,
    violations: &mut Vec<String>,
) -> Option<NaiveDate> {
    let raw = non_blank(raw)?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        violations.push(format!("{field} must be a valid date (YYYY-MM-DD)"));
    }
    parsed
}

/// Page number: defaults to 1, floored at 1.
pub fn normalize_page(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| *p != 0)
        .map(|p| p.clamp(1, i64::from(u32::MAX)) as u32)
        .unwrap_or(DEFAULT_PAGE)
}

/// Page size: defaults to 10 (also for `0`), clamped to `[1, 100]`.
pub fn normalize_limit(raw: Option<&str>) -> u32 {
    raw.and_then(|l| l.trim().parse::<i64>().ok())
        .filter(|l| *l != 0)
        .map(|l| l.clamp(1, i64::from(MAX_LIMIT)) as u32)
        .unwrap_or(DEFAULT_LIMIT)
}

impl QueryPlan {
    pub fn compile(params: &TaskQueryParams) -> Result<Self, AppError> {
        let mut violations = Vec::new();

        let filter = TaskFilter {
            status: parse_filter_enum(
                "status",
                &params.status,
                TaskStatus::legal_values(),
                &mut violations,
            ),
            priority: parse_filter_enum(
                "priority",
                &params.priority,
                TaskPriority::legal_values(),
                &mut violations,
            ),
            category: parse_filter_enum(
                "category",
                &params.category,
                TaskCategory::legal_values(),
                &mut violations,
            ),
            due_from: parse_filter_date("dueFrom", &params.due_from, &mut violations),
            due_to: parse_filter_date("dueTo", &params.due_to, &mut violations),
            text: non_blank(&params.q).map(str::to_lowercase),
        };

        let sort = match non_blank(&params.sort) {
            Some(raw) => match SortKey::parse(raw) {
                Ok(key) => key,
                Err(AppError::ValidationFailed { details }) => {
                    violations.extend(details);
                    SortKey::default()
                }
                Err(other) => return Err(other),
            },
            None => SortKey::default(),
        };

        if !violations.is_empty() {
            return Err(AppError::validation(violations));
        }

        let page = normalize_page(params.page.as_deref());
        let limit = normalize_limit(params.limit.as_deref());
        Ok(Self {
            filter,
            sort,
            page,
            limit,
            offset: u64::from(page - 1) * u64::from(limit),
        })
    }
}

/// One page of results plus the totals for the unpaginated match set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(plan: &QueryPlan, items: Vec<T>, total: u64) -> Self {
        Self::from_window(&plan.window(), items, total)
    }

    pub fn from_window(window: &PageWindow, items: Vec<T>, total: u64) -> Self {
        Self {
            page: window.page,
            limit: window.limit,
            total,
            pages: total.div_ceil(u64::from(window.limit)),
            items,
        }
    }
}

/// Raw paging parameters for listings without filters. `size` is accepted
/// as an alias of `limit`.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default, alias = "size")]
    pub limit: Option<String>,
}

/// A normalized page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
}

impl PageWindow {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit, offset: u64::from(page.saturating_sub(1)) * u64::from(limit) }
    }

    pub fn from_params(params: &PageParams) -> Self {
        Self::new(
            normalize_page(params.page.as_deref()),
            normalize_limit(params.limit.as_deref()),
        )
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

impl QueryPlan {
    pub fn window(&self) -> PageWindow {
        PageWindow { page: self.page, limit: self.limit, offset: self.offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTask;

    fn params() -> TaskQueryParams {
        TaskQueryParams::default()
    }

    fn task(title: &str, description: &str, due: (i32, u32, u32)) -> Task {
        Task::new(NewTask {
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            due_date: NaiveDate::from_ymd_opt(due.0, due.1, due.2).unwrap(),
            category: TaskCategory::Other,
        })
    }

    #[test]
    fn empty_params_yield_default_plan() {
        let plan = QueryPlan::compile(&params()).unwrap();
        assert_eq!(plan, QueryPlan::default());
        assert_eq!(plan.sort, SortKey { field: SortField::CreatedAt, descending: true });
    }

    #[test]
    fn title_sort_is_byte_ordered() {
        let upper = task("Zebra", "", (2025, 1, 1));
        let lower = task("apple", "", (2025, 1, 1));
        let key = SortKey { field: SortField::Title, descending: false };
        assert_eq!(key.compare(&upper, &lower), Ordering::Less);
        assert!(SortField::Title.is_text());
        assert!(!SortField::DueDate.is_text());
    }

    #[test]
    fn page_and_limit_are_clamped() {
        let plan = QueryPlan::compile(&TaskQueryParams {
            page: Some("0".into()),
            limit: Some("1000".into()),
            ..params()
        })
        .unwrap();
        assert_eq!(plan.page, 1);
        assert_eq!(plan.limit, 100);
        assert_eq!(plan.offset, 0);

        assert_eq!(normalize_page(Some("-4")), 1);
        assert_eq!(normalize_page(Some("abc")), 1);
        assert_eq!(normalize_limit(Some("-3")), 1);
        assert_eq!(normalize_limit(Some("0")), 10);
        assert_eq!(normalize_limit(Some("25")), 25);
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let plan = QueryPlan::compile(&TaskQueryParams {
            page: Some("3".into()),
            limit: Some("20".into()),
            ..params()
        })
        .unwrap();
        assert_eq!(plan.offset, 40);
    }

    #[test]
    fn compile_is_deterministic() {
        let p = TaskQueryParams {
            status: Some("completed".into()),
            q: Some("Milk".into()),
            sort: Some("dueDate".into()),
            ..params()
        };
        assert_eq!(QueryPlan::compile(&p).unwrap(), QueryPlan::compile(&p).unwrap());
    }

    #[test]
    fn filters_are_parsed_into_domain_values() {
        let plan = QueryPlan::compile(&TaskQueryParams {
            status: Some("in-progress".into()),
            priority: Some("high".into()),
            category: Some("Work".into()),
            due_from: Some("2025-10-01".into()),
            due_to: Some("2025-10-31".into()),
            q: Some("  HW6 ".into()),
            ..params()
        })
        .unwrap();
        assert_eq!(plan.filter.status, Some(TaskStatus::InProgress));
        assert_eq!(plan.filter.priority, Some(TaskPriority::High));
        assert_eq!(plan.filter.category, Some(TaskCategory::Work));
        assert_eq!(plan.filter.due_from, NaiveDate::from_ymd_opt(2025, 10, 1));
        assert_eq!(plan.filter.text.as_deref(), Some("hw6"));
    }

    #[test]
    fn bad_filter_values_are_rejected_together() {
        let err = QueryPlan::compile(&TaskQueryParams {
            status: Some("done".into()),
            due_to: Some("soon".into()),
            sort: Some("-color".into()),
            ..params()
        })
        .unwrap_err();
        match err {
            AppError::ValidationFailed { details } => {
                assert_eq!(details.len(), 3);
                assert_eq!(details[0], "status must be pending|in-progress|completed");
                assert_eq!(details[1], "dueTo must be a valid date (YYYY-MM-DD)");
                assert!(details[2].starts_with("sort must be one of"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn sort_parses_direction_marker() {
        assert_eq!(
            SortKey::parse("-dueDate").unwrap(),
            SortKey { field: SortField::DueDate, descending: true }
        );
        assert_eq!(
            SortKey::parse("title").unwrap(),
            SortKey { field: SortField::Title, descending: false }
        );
    }

    #[test]
    fn text_matches_title_or_description_case_insensitively() {
        let filter = TaskFilter { text: Some("milk".into()), ..Default::default() };
        assert!(filter.matches(&task("Groceries", "2% Milk for the week", (2025, 10, 25))));
        assert!(filter.matches(&task("MILK run", "", (2025, 10, 25))));
        assert!(!filter.matches(&task("Evening walk", "30 minutes", (2025, 10, 22))));
    }

    #[test]
    fn due_range_is_inclusive() {
        let filter = TaskFilter {
            due_from: NaiveDate::from_ymd_opt(2025, 10, 22),
            due_to: NaiveDate::from_ymd_opt(2025, 10, 23),
            ..Default::default()
        };
        assert!(filter.matches(&task("a", "", (2025, 10, 22))));
        assert!(filter.matches(&task("b", "", (2025, 10, 23))));
        assert!(!filter.matches(&task("c", "", (2025, 10, 25))));
    }

    #[test]
    fn compare_breaks_ties_by_id() {
        let a = task("same", "", (2025, 10, 22));
        let mut b = a.clone();
        b.id = format!("{}z", a.id);
        let key = SortKey { field: SortField::Title, descending: true };
        assert_eq!(key.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn pages_round_up() {
        let plan = QueryPlan { limit: 10, ..QueryPlan::default() };
        let page: Page<()> = Page::new(&plan, vec![], 21);
        assert_eq!(page.pages, 3);
        let empty: Page<()> = Page::new(&plan, vec![], 0);
        assert_eq!(empty.pages, 0);
    }

    #[test]
    fn page_window_accepts_size_alias() {
        let params: PageParams = serde_json::from_value(serde_json::json!({
            "page": "3",
            "size": "20"
        }))
        .unwrap();
        let window = PageWindow::from_params(&params);
        assert_eq!(window, PageWindow { page: 3, limit: 20, offset: 40 });

        let page = Page::from_window(&window, vec!["x"], 41);
        assert_eq!(page.pages, 3);
        assert_eq!(PageWindow::from_params(&PageParams::default()), PageWindow::default());
    }
}
