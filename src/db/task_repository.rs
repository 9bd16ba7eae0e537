use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::error;

use super::TaskRepository;
use crate::errors::AppError;
use crate::models::Task;
use crate::query::{QueryPlan, SortKey, TaskFilter};

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, due_date, category, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: String,
    status: String,
    priority: String,
    due_date: NaiveDate,
    category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let corrupt = |e: String| AppError::Unexpected(format!("Corrupt task row {}: {e}", row.id));
        Ok(Task {
            status: row.status.parse().map_err(corrupt)?,
            priority: row.priority.parse().map_err(corrupt)?,
            category: row.category.parse().map_err(corrupt)?,
            id: row.id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Escapes `%`, `_` and `\` so a search term is matched literally by ILIKE.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &TaskFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority.as_str());
    }
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(from) = filter.due_from {
        qb.push(" AND due_date >= ").push_bind(from);
    }
    if let Some(to) = filter.due_to {
        qb.push(" AND due_date <= ").push_bind(to);
    }
    if let Some(text) = &filter.text {
        let pattern = format!("%{}%", escape_like(text));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn rows_to_tasks(rows: Vec<TaskRow>) -> Result<Vec<Task>, AppError> {
    rows.into_iter().map(Task::try_from).collect()
}

/// Text columns are compared under the "C" collation so the database agrees
/// with [`SortKey::compare`].
fn push_order(qb: &mut QueryBuilder<'_, Postgres>, sort: &SortKey) {
    let direction = if sort.descending { "DESC" } else { "ASC" };
    let collation = if sort.field.is_text() { " COLLATE \"C\"" } else { "" };
    qb.push(format!(
        " ORDER BY {}{collation} {direction}, id COLLATE \"C\" ASC",
        sort.field.column()
    ));
}

#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn find_page(&self, plan: &QueryPlan) -> Result<(Vec<Task>, u64), AppError> {
        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));
        push_filter(&mut select, &plan.filter);
        push_order(&mut select, &plan.sort);
        select
            .push(" LIMIT ")
            .push_bind(i64::from(plan.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(plan.offset).unwrap_or(i64::MAX));

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_filter(&mut count, &plan.filter);

        let (rows, total) = futures_util::future::try_join(
            select.build_query_as::<TaskRow>().fetch_all(&self.pool),
            count.build_query_scalar::<i64>().fetch_one(&self.pool),
        )
        .await
        .map_err(|e| {
            error!("Failed to list tasks: {e}");
            AppError::db_query("Failed to list tasks", e)
        })?;

        Ok((rows_to_tasks(rows)?, u64::try_from(total).unwrap_or_default()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Task>, AppError> {
        sqlx::query_as::<_, TaskRow>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to find task {id}: {e}");
                AppError::db_query(format!("Failed to find task {id}"), e)
            })?
            .map(Task::try_from)
            .transpose()
    }

    async fn insert(&self, task: &Task) -> Result<Task, AppError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "INSERT INTO tasks ({TASK_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(task.category.as_str())
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| super::write_error("Failed to save task", "Duplicate key", e))?;
        Task::try_from(row)
    }

    async fn update(&self, task: &Task) -> Result<Option<Task>, AppError> {
        sqlx::query_as::<_, TaskRow>(&format!(
            "UPDATE tasks
             SET title = $2, description = $3, status = $4, priority = $5,
                 due_date = $6, category = $7, updated_at = $8
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(task.category.as_str())
        .bind(task.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| super::write_error("Failed to update task", "Duplicate key", e))?
        .map(Task::try_from)
        .transpose()
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete task {id}: {e}");
                AppError::db_query(format!("Failed to delete task {id}"), e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use crate::query::SortField;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("2% milk"), "2\\% milk");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn filter_renders_bound_predicates() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Completed),
            text: Some("milk".into()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_filter(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM tasks WHERE TRUE AND status = $1 \
             AND (title ILIKE $2 OR description ILIKE $3)"
        );
    }

    #[test]
    fn text_sorts_use_byte_collation() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM tasks");
        push_order(&mut qb, &SortKey { field: SortField::Title, descending: false });
        assert_eq!(
            qb.sql(),
            "SELECT id FROM tasks ORDER BY title COLLATE \"C\" ASC, id COLLATE \"C\" ASC"
        );

        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM tasks");
        push_order(&mut qb, &SortKey { field: SortField::DueDate, descending: true });
        assert_eq!(qb.sql(), "SELECT id FROM tasks ORDER BY due_date DESC, id COLLATE \"C\" ASC");
    }

    #[test]
    fn corrupt_enum_columns_surface_as_errors() {
        let row = TaskRow {
            id: "t1".into(),
            title: "x".into(),
            description: String::new(),
            status: "archived".into(),
            priority: "low".into(),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            category: "Work".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(Task::try_from(row), Err(AppError::Unexpected(_))));
    }
}
