/// Task endpoints
///
/// Every route is gated on membership of the task's project.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthUser,
};
use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    events::ActivityEvent,
    models::{
        task::{CreateTask, Task, TaskStatus},
        task_history::TaskHistory,
    },
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 300, message = "Title must be 1-300 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct MoveTaskRequest {
    /// Parsed into [`TaskStatus`] by the handler
    pub to_status: String,
}

#[derive(Debug, Serialize)]
pub struct MoveTaskResponse {
    pub ok: bool,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(req) = payload?;
    req.validate()?;
    state.members.require_member(project_id, auth.user_id).await?;

    let task = state
        .workflow
        .create_task(CreateTask {
            project_id,
            title: req.title,
            description: req.description.unwrap_or_default(),
            assignee_id: req.assignee_id,
        })
        .await?;

    state
        .notifier
        .record(ActivityEvent::TaskCreated {
            project_id,
            task_id: task.id,
            title: task.title.clone(),
            by: auth.user_id,
        })
        .await;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    state.members.require_member(project_id, auth.user_id).await?;

    let tasks = state.workflow.list_tasks(project_id).await?;
    Ok(Json(tasks))
}

/// Moves a task to another status
///
/// # Errors
///
/// - 400 for a status other than todo, doing, done
/// - 404 for an unknown task
/// - 403 if the caller isn't a member of the task's project
pub async fn move_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
    payload: Result<Json<MoveTaskRequest>, JsonRejection>,
) -> ApiResult<Json<MoveTaskResponse>> {
    let Json(req) = payload?;
    let to: TaskStatus = req
        .to_status
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid status".to_string()))?;

    let task = state.workflow.find_task(task_id).await?;
    state.members.require_member(task.project_id, auth.user_id).await?;

    let change = state.workflow.move_task(task_id, to, auth.user_id).await?;

    state
        .notifier
        .record(ActivityEvent::TaskMoved {
            project_id: change.project_id,
            task_id,
            from: change.from,
            to: change.to,
            by: auth.user_id,
        })
        .await;

    Ok(Json(MoveTaskResponse {
        ok: true,
        from: change.from,
        to: change.to,
    }))
}

pub async fn task_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TaskHistory>>> {
    let task = state.workflow.find_task(task_id).await?;
    state.members.require_member(task.project_id, auth.user_id).await?;

    let history = state.workflow.task_history(task_id).await?;
    Ok(Json(history))
}
