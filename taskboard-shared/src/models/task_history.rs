/// Task history model
///
/// Append-only audit log of status moves. Rows are written by
/// [`Task::transition`](super::task::Task::transition) and never updated.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_history (
///     id BIGSERIAL PRIMARY KEY,
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     from_status task_status NOT NULL,
///     to_status task_status NOT NULL,
///     changed_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     changed_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::task::TaskStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskHistory {
    /// Monotonic id; breaks ties between equal timestamps
    pub id: i64,

    pub task_id: Uuid,
    pub from_status: TaskStatus,
    pub to_status: TaskStatus,

    /// User who performed the move
    pub changed_by: Uuid,

    pub changed_at: DateTime<Utc>,
}

impl TaskHistory {
    /// Lists a task's moves in the order they happened
    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TaskHistory>(
            r#"
            SELECT id, task_id, from_status, to_status, changed_by, changed_at
            FROM task_history
            WHERE task_id = $1
            ORDER BY changed_at ASC, id ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
