/// Task model and database operations
///
/// Tasks move freely between `todo`, `doing` and `done`. There is no terminal
/// state and no adjacency rule; every move, including a no-op move, appends a
/// row to `task_history` in the same transaction that updates the task.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'doing', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(300) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'todo',
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{CreateTask, Task, TaskStatus};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let project_id = Uuid::new_v4();
/// let user_id = Uuid::new_v4();
///
/// let task = Task::create(&pool, CreateTask {
///     project_id,
///     title: "Write docs".to_string(),
///     description: String::new(),
///     assignee_id: None,
/// }).await?;
///
/// let change = Task::transition(&pool, task.id, TaskStatus::Doing, user_id).await?;
/// assert_eq!(change.map(|c| c.from), Some(TaskStatus::Todo));
/// # Ok(())
/// # }
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not started (initial status)
    Todo,

    /// In progress
    Doing,

    /// Finished; can still be moved back
    Done,
}

impl TaskStatus {
    /// Every status, in board order
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::Doing, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Doing => "doing",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status: {0}")]
pub struct ParseTaskStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "doing" => Ok(TaskStatus::Doing),
            "done" => Ok(TaskStatus::Done),
            other => Err(ParseTaskStatusError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    pub title: String,

    /// Free text, empty by default
    pub description: String,

    pub status: TaskStatus,

    /// Optional assignee (any user id)
    pub assignee_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    /// Bumped on every move
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub assignee_id: Option<Uuid>,
}

/// Outcome of a successful move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub task_id: Uuid,
    pub project_id: Uuid,

    /// Status read under the row lock
    pub from: TaskStatus,

    pub to: TaskStatus,
}

impl Task {
    /// Inserts a task in `todo`; no history row is written
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, title, description, assignee_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, project_id, title, description, status, assignee_id, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.assignee_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, title, description, status, assignee_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists a project's tasks, oldest first
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, title, description, status, assignee_id, created_at, updated_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Moves a task to `to` and appends the history row
    ///
    /// Moves on the same task serialize on the row lock, so the recorded
    /// `from` is always the status the previous move wrote.
    ///
    /// # Returns
    ///
    /// `None` if the task doesn't exist
    pub async fn transition(
        pool: &PgPool,
        id: Uuid,
        to: TaskStatus,
        changed_by: Uuid,
    ) -> Result<Option<StatusChange>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<(Uuid, TaskStatus)> = sqlx::query_as(
            r#"
            SELECT project_id, status
            FROM tasks
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let (project_id, from) = match current {
            Some(row) => row,
            None => return Ok(None),
        };

        sqlx::query(
            r#"
            UPDATE tasks
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(to)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO task_history (task_id, from_status, to_status, changed_by)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(changed_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(StatusChange {
            task_id: id,
            project_id,
            from,
            to,
        }))
    }

    /// Counts a project's tasks grouped by status
    ///
    /// Statuses with no tasks are absent from the result.
    pub async fn count_by_status(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<(TaskStatus, i64)>, sqlx::Error> {
        let counts: Vec<(TaskStatus, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*)
            FROM tasks
            WHERE project_id = $1
            GROUP BY status
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(counts)
    }
}
