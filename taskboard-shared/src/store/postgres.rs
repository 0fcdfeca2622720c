/// PostgreSQL store backed by the model SQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::{
    InvitationStore, NotificationStore, ProjectStore, Store, StoreError, StoreHealth, StoreResult,
    TaskStore, UserStore,
};
use crate::db::pool::{close_pool, ping, pool_stats};
use crate::models::{
    invitation::{Invitation, NewInvitation, Redemption},
    membership::ProjectMember,
    notification::Notification,
    project::{CreateProject, Project},
    task::{CreateTask, StatusChange, Task, TaskStatus},
    task_history::TaskHistory,
    user::{CreateUser, User},
};

/// Store over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps unique violations to [`StoreError::Conflict`] and foreign key
/// violations to [`StoreError::InvalidReference`]
fn classify(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(what.to_string())
        }
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            let target = match db_err.constraint() {
                Some("tasks_assignee_id_fkey") => "assignee",
                Some("tasks_project_id_fkey") => "project",
                _ => what,
            };
            StoreError::InvalidReference(target.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data)
            .await
            .map_err(|e| classify(e, "username"))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn insert_project(&self, data: CreateProject) -> StoreResult<Project> {
        Ok(Project::create_with_owner(&self.pool, data).await?)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(Project::list_for_user(&self.pool, user_id).await?)
    }

    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(ProjectMember::is_member(&self.pool, project_id, user_id).await?)
    }
}

#[async_trait]
impl InvitationStore for PgStore {
    async fn insert_invitation(&self, data: NewInvitation) -> StoreResult<Invitation> {
        Invitation::create(&self.pool, data)
            .await
            .map_err(|e| classify(e, "invitation token"))
    }

    async fn redeem_invitation(
        &self,
        token_hash: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Redemption> {
        Ok(Invitation::redeem(&self.pool, token_hash, user_id, now).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        Task::create(&self.pool, data)
            .await
            .map_err(|e| classify(e, "task reference"))
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_project(&self.pool, project_id).await?)
    }

    async fn transition_task(
        &self,
        id: Uuid,
        to: TaskStatus,
        changed_by: Uuid,
    ) -> StoreResult<Option<StatusChange>> {
        Ok(Task::transition(&self.pool, id, to, changed_by).await?)
    }

    async fn task_history(&self, task_id: Uuid) -> StoreResult<Vec<TaskHistory>> {
        Ok(TaskHistory::list_by_task(&self.pool, task_id).await?)
    }

    async fn count_tasks_by_status(&self, project_id: Uuid) -> StoreResult<Vec<(TaskStatus, i64)>> {
        Ok(Task::count_by_status(&self.pool, project_id).await?)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(&self, user_id: Uuid, message: &str) -> StoreResult<Notification> {
        Ok(Notification::create(&self.pool, user_id, message).await?)
    }

    async fn list_notifications(&self, user_id: Uuid) -> StoreResult<Vec<Notification>> {
        Ok(Notification::list_by_user(&self.pool, user_id).await?)
    }

    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(Notification::mark_read(&self.pool, id, user_id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health(&self) -> StoreHealth {
        let healthy = match ping(&self.pool).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            }
        };

        StoreHealth {
            backend: "postgres",
            healthy,
            pool: Some(pool_stats(&self.pool)),
        }
    }

    async fn close(&self) {
        close_pool(&self.pool).await;
    }
}
