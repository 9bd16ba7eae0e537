use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::db::TaskRepository;
use crate::errors::AppError;
use crate::models::{Task, TaskCandidate};
use crate::query::{Page, QueryPlan};
use crate::validation::{validate_new_task, validate_task_changes};

/// Sole write path to stored tasks: validates on the way in and compiles
/// query plans on the way out.
#[derive(Clone)]
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
}

/// Rejects ids that could never have been issued by `create`.
pub(crate) fn check_id(id: &str) -> Result<(), AppError> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| AppError::InvalidId { id: id.to_string() })
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, plan: &QueryPlan) -> Result<Page<Task>, AppError> {
        let (items, total) = self.repo.find_page(plan).await?;
        debug!("Listed {} of {total} tasks (page {}, limit {})", items.len(), plan.page, plan.limit);
        Ok(Page::new(plan, items, total))
    }

    pub async fn create(&self, candidate: &TaskCandidate) -> Result<Task, AppError> {
        let draft = validate_new_task(candidate)?;
        let task = self.repo.insert(&Task::new(draft)).await?;
        info!("Created task {}", task.id);
        Ok(task)
    }

    pub async fn get(&self, id: &str) -> Result<Task, AppError> {
        check_id(id)?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Task", id))
    }

    pub async fn update(&self, id: &str, partial: &TaskCandidate) -> Result<Task, AppError> {
        check_id(id)?;
        let changes = validate_task_changes(partial)?;
        let mut task = self.get(id).await?;
        task.apply(changes);
        let updated = self
            .repo
            .update(&task)
            .await?
            .ok_or_else(|| AppError::not_found("Task", id))?;
        info!("Updated task {id}");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        check_id(id)?;
        if self.repo.delete(id).await? {
            info!("Deleted task {id}");
            Ok(())
        } else {
            Err(AppError::not_found("Task", id))
        }
    }

    /// Inserts the sample tasks when the store holds none. Returns how many
    /// were inserted.
    pub async fn seed_if_empty(&self) -> Result<usize, AppError> {
        let (_, total) = self.repo.find_page(&QueryPlan::default()).await?;
        if total > 0 {
            return Ok(0);
        }
        let samples = sample_tasks();
        for candidate in &samples {
            self.create(candidate).await?;
        }
        info!("Seeded {} sample tasks", samples.len());
        Ok(samples.len())
    }
}

fn sample_tasks() -> Vec<TaskCandidate> {
    let sample = |title: &str, description: &str, status: &str, priority: &str, due: &str, category: &str| {
        TaskCandidate {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            status: Some(status.to_string()),
            priority: Some(priority.to_string()),
            due_date: Some(due.to_string()),
            category: Some(category.to_string()),
        }
    };
    vec![
        sample("Buy milk", "2% milk for the week", "pending", "medium", "2025-10-25", "Shopping"),
        sample("Finish HW6 writeup", "Add screenshots of API tests", "in-progress", "high", "2025-10-23", "Work"),
        sample("Evening walk", "30 minutes", "pending", "low", "2025-10-22", "Health"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryTaskRepository;
    use crate::models::{TaskPriority, TaskStatus};
    use crate::query::TaskQueryParams;

    fn service() -> TaskService {
        TaskService::new(Arc::new(MemoryTaskRepository::new()))
    }

    fn candidate(title: &str, description: &str, status: &str) -> TaskCandidate {
        TaskCandidate {
            title: Some(title.into()),
            description: Some(description.into()),
            status: Some(status.into()),
            due_date: Some("2025-10-25".into()),
            category: Some("Shopping".into()),
            ..Default::default()
        }
    }

    fn plan(params: TaskQueryParams) -> QueryPlan {
        QueryPlan::compile(&params).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_defaults() {
        let svc = service();
        let task = svc
            .create(&TaskCandidate {
                title: Some("Buy milk".into()),
                due_date: Some("2025-10-25".into()),
                category: Some("Shopping".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(Uuid::parse_str(&task.id).is_ok());
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(svc.get(&task.id).await.unwrap(), task);
    }

    #[tokio::test]
    async fn create_rejects_invalid_candidate_without_persisting() {
        let svc = service();
        let err = svc.create(&TaskCandidate::default()).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed { .. }));
        let page = svc.list(&QueryPlan::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn empty_update_only_touches_updated_at() {
        let svc = service();
        let task = svc.create(&candidate("Buy milk", "", "pending")).await.unwrap();
        let updated = svc.update(&task.id, &TaskCandidate::default()).await.unwrap();
        assert_eq!(updated.title, task.title);
        assert_eq!(updated.description, task.description);
        assert_eq!(updated.status, task.status);
        assert_eq!(updated.priority, task.priority);
        assert_eq!(updated.due_date, task.due_date);
        assert_eq!(updated.category, task.category);
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at >= task.updated_at);
    }

    #[tokio::test]
    async fn update_merges_and_validates_supplied_fields() {
        let svc = service();
        let task = svc.create(&candidate("Buy milk", "", "pending")).await.unwrap();

        let partial = TaskCandidate { status: Some("completed".into()), ..Default::default() };
        let updated = svc.update(&task.id, &partial).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.title, "Buy milk");

        let bad = TaskCandidate { priority: Some("urgent".into()), ..Default::default() };
        assert!(matches!(
            svc.update(&task.id, &bad).await,
            Err(AppError::ValidationFailed { .. })
        ));
        assert_eq!(svc.get(&task.id).await.unwrap().priority, TaskPriority::Medium);
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_not_found() {
        let svc = service();
        let id = Uuid::new_v4().to_string();
        let err = svc.update(&id, &TaskCandidate::default()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn second_delete_reports_not_found() {
        let svc = service();
        let task = svc.create(&candidate("Buy milk", "", "pending")).await.unwrap();
        svc.delete(&task.id).await.unwrap();
        assert!(svc.delete(&task.id).await.unwrap_err().is_not_found());
        assert!(svc.get(&task.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected_before_storage() {
        let svc = service();
        assert!(matches!(svc.get("not-a-uuid").await, Err(AppError::InvalidId { .. })));
        assert!(matches!(svc.delete("42").await, Err(AppError::InvalidId { .. })));
    }

    #[tokio::test]
    async fn status_filter_returns_only_matching_tasks() {
        let svc = service();
        svc.create(&candidate("Open", "", "pending")).await.unwrap();
        let done = svc.create(&candidate("Closed", "", "completed")).await.unwrap();

        let page = svc
            .list(&plan(TaskQueryParams { status: Some("completed".into()), ..Default::default() }))
            .await
            .unwrap();
        assert_eq!(page.items, vec![done]);
        assert_eq!(page.total, 1);
        assert_eq!(page.pages, 1);
    }

    #[tokio::test]
    async fn text_search_hits_description() {
        let svc = service();
        svc.create(&candidate("Groceries", "2% milk for the week", "pending")).await.unwrap();
        svc.create(&candidate("Evening walk", "30 minutes", "pending")).await.unwrap();

        let page = svc
            .list(&plan(TaskQueryParams { q: Some("MILK".into()), ..Default::default() }))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "Groceries");
    }

    #[tokio::test]
    async fn listing_twice_without_writes_is_identical() {
        let svc = service();
        for i in 0..7 {
            svc.create(&candidate(&format!("task {i}"), "", "pending")).await.unwrap();
        }
        let p = plan(TaskQueryParams { limit: Some("3".into()), page: Some("2".into()), ..Default::default() });
        let first = svc.list(&p).await.unwrap();
        let second = svc.list(&p).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.total, 7);
        assert_eq!(first.pages, 3);
    }

    #[tokio::test]
    async fn seeding_only_happens_once() {
        let svc = service();
        assert_eq!(svc.seed_if_empty().await.unwrap(), 3);
        assert_eq!(svc.seed_if_empty().await.unwrap(), 0);
        assert_eq!(svc.list(&QueryPlan::default()).await.unwrap().total, 3);
    }
}
