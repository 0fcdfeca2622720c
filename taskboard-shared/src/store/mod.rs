/// Persistence seam for the domain services
///
/// Services talk to an `Arc<dyn Store>`. Two backends implement it:
/// [`PgStore`] delegates to the SQL in [`crate::models`], and
/// [`InMemoryStore`] keeps everything behind one lock for tests and
/// database-less local runs. Both honour the same atomicity rules: project
/// creation with its owner membership, invitation redemption, and task moves
/// are all-or-nothing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::pool::PoolStats;
use crate::models::{
    invitation::{Invitation, NewInvitation, Redemption},
    notification::Notification,
    project::{CreateProject, Project},
    task::{CreateTask, StatusChange, Task, TaskStatus},
    task_history::TaskHistory,
    user::{CreateUser, User},
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("duplicate {0}")]
    Conflict(String),

    /// The write names a row that does not exist (e.g. an unknown assignee)
    #[error("unknown {0}")]
    InvalidReference(String),

    /// The backend cannot serve requests (e.g. a poisoned lock)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Backend status reported by `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct StoreHealth {
    /// "postgres" or "memory"
    pub backend: &'static str,

    pub healthy: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the username is taken
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Inserts a project together with the owner's membership
    async fn insert_project(&self, data: CreateProject) -> StoreResult<Project>;

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Projects the user is a member of, oldest membership first
    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>>;

    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait InvitationStore: Send + Sync {
    async fn insert_invitation(&self, data: NewInvitation) -> StoreResult<Invitation>;

    /// Redeems by token digest, judging expiry against `now`
    ///
    /// Checks run in order: unknown, expired, used. On success the `used`
    /// flip and the membership insert land together
    async fn redeem_invitation(
        &self,
        token_hash: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Redemption>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Tasks of a project, oldest first
    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>>;

    /// Moves a task and appends its history row atomically
    ///
    /// Returns `None` when the task does not exist
    async fn transition_task(
        &self,
        id: Uuid,
        to: TaskStatus,
        changed_by: Uuid,
    ) -> StoreResult<Option<StatusChange>>;

    /// History rows ordered by `(changed_at, id)`
    async fn task_history(&self, task_id: Uuid) -> StoreResult<Vec<TaskHistory>>;

    /// Task counts per status; statuses with no tasks may be absent
    async fn count_tasks_by_status(&self, project_id: Uuid) -> StoreResult<Vec<(TaskStatus, i64)>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, user_id: Uuid, message: &str) -> StoreResult<Notification>;

    /// Newest first
    async fn list_notifications(&self, user_id: Uuid) -> StoreResult<Vec<Notification>>;

    /// Returns `false` when no notification with this id belongs to the user
    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool>;
}

/// Complete persistence contract used by the application state
#[async_trait]
pub trait Store: UserStore + ProjectStore + InvitationStore + TaskStore + NotificationStore {
    async fn health(&self) -> StoreHealth;

    /// Releases backend resources at shutdown
    async fn close(&self);
}
