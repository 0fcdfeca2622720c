/// Task creation and the status workflow

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::task::{CreateTask, StatusChange, Task, TaskStatus};
use crate::models::task_history::TaskHistory;
use crate::store::{Store, StoreError};

#[derive(Clone)]
pub struct TaskWorkflow {
    store: Arc<dyn Store>,
}

impl TaskWorkflow {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a task in `todo`
    ///
    /// No history row is written for creation.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` if `assignee_id` names no user
    pub async fn create_task(&self, data: CreateTask) -> CoreResult<Task> {
        let task = self.store.insert_task(data).await.map_err(|e| match e {
            StoreError::InvalidReference(what) => CoreError::NotFound(what),
            other => CoreError::Store(other),
        })?;
        info!(task_id = %task.id, project_id = %task.project_id, "Task created");
        Ok(task)
    }

    /// Moves a task to `to` and records the move
    ///
    /// Any status may follow any other, including itself.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` if the task doesn't exist
    pub async fn move_task(&self, task_id: Uuid, to: TaskStatus, changed_by: Uuid) -> CoreResult<StatusChange> {
        let change = self
            .store
            .transition_task(task_id, to, changed_by)
            .await?
            .ok_or_else(|| CoreError::not_found("task"))?;

        info!(
            task_id = %task_id,
            from = %change.from,
            to = %change.to,
            changed_by = %changed_by,
            "Task moved"
        );
        Ok(change)
    }

    pub async fn find_task(&self, task_id: Uuid) -> CoreResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or_else(|| CoreError::not_found("task"))
    }

    pub async fn list_tasks(&self, project_id: Uuid) -> CoreResult<Vec<Task>> {
        Ok(self.store.list_tasks(project_id).await?)
    }

    /// Moves of a task, oldest first
    pub async fn task_history(&self, task_id: Uuid) -> CoreResult<Vec<TaskHistory>> {
        Ok(self.store.task_history(task_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn new_task(project_id: Uuid, title: &str) -> CreateTask {
        CreateTask {
            project_id,
            title: title.to_string(),
            description: String::new(),
            assignee_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_task_unknown_assignee_is_not_found() {
        let workflow = TaskWorkflow::new(Arc::new(InMemoryStore::new()));
        let mut data = new_task(Uuid::new_v4(), "t");
        data.assignee_id = Some(Uuid::new_v4());

        let result = workflow.create_task(data).await;
        assert!(matches!(result, Err(CoreError::NotFound(ref what)) if what == "assignee"));
    }

    #[tokio::test]
    async fn test_create_task_defaults() {
        let workflow = TaskWorkflow::new(Arc::new(InMemoryStore::new()));
        let task = workflow.create_task(new_task(Uuid::new_v4(), "t")).await.expect("create");

        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.description, "");
        assert_eq!(task.created_at, task.updated_at);
        assert!(workflow.task_history(task.id).await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn test_move_todo_doing_done() {
        let workflow = TaskWorkflow::new(Arc::new(InMemoryStore::new()));
        let user = Uuid::new_v4();
        let task = workflow.create_task(new_task(Uuid::new_v4(), "t")).await.expect("create");

        workflow.move_task(task.id, TaskStatus::Doing, user).await.expect("move");
        let change = workflow.move_task(task.id, TaskStatus::Done, user).await.expect("move");
        assert_eq!((change.from, change.to), (TaskStatus::Doing, TaskStatus::Done));

        let history = workflow.task_history(task.id).await.expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].from_status, TaskStatus::Todo);
        assert_eq!(history[0].to_status, TaskStatus::Doing);
        assert_eq!(history[1].from_status, TaskStatus::Doing);
        assert_eq!(history[1].to_status, TaskStatus::Done);
        assert!(history.iter().all(|h| h.changed_by == user));

        let stored = workflow.find_task(task.id).await.expect("find");
        assert_eq!(stored.status, TaskStatus::Done);
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn test_noop_move_is_recorded() {
        let workflow = TaskWorkflow::new(Arc::new(InMemoryStore::new()));
        let task = workflow.create_task(new_task(Uuid::new_v4(), "t")).await.expect("create");

        let change = workflow
            .move_task(task.id, TaskStatus::Todo, Uuid::new_v4())
            .await
            .expect("move");
        assert_eq!(change.from, change.to);
        assert_eq!(workflow.task_history(task.id).await.expect("history").len(), 1);
    }

    #[tokio::test]
    async fn test_move_unknown_task() {
        let workflow = TaskWorkflow::new(Arc::new(InMemoryStore::new()));
        let result = workflow
            .move_task(Uuid::new_v4(), TaskStatus::Done, Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_moves_form_a_chain() {
        let workflow = TaskWorkflow::new(Arc::new(InMemoryStore::new()));
        let task = workflow.create_task(new_task(Uuid::new_v4(), "t")).await.expect("create");

        let mut handles = Vec::new();
        for i in 0..12 {
            let workflow = workflow.clone();
            let to = TaskStatus::ALL[i % 3];
            handles.push(tokio::spawn(async move {
                workflow.move_task(task.id, to, Uuid::new_v4()).await
            }));
        }
        for handle in handles {
            handle.await.expect("join").expect("move");
        }

        // each recorded `from` is the previous recorded `to`
        let history = workflow.task_history(task.id).await.expect("history");
        assert_eq!(history.len(), 12);
        assert_eq!(history[0].from_status, TaskStatus::Todo);
        for pair in history.windows(2) {
            assert_eq!(pair[0].to_status, pair[1].from_status);
        }
    }
}
