/// Project endpoints
///
/// All routes here require authentication. Invite and report additionally
/// require membership of the project in the path.

use crate::{app::AppState, error::ApiResult, middleware::auth::AuthUser};
use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_shared::{events::ActivityEvent, models::project::Project, services::ProjectReport};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub invitation_id: Uuid,

    /// Shown once; only its digest is stored
    pub token: String,

    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub ok: bool,
    pub project_id: Uuid,
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let Json(req) = payload?;
    req.validate()?;

    let project = state.members.create_project(&req.name, auth.user_id).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// Lists projects the caller belongs to
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = state.members.list_projects_for_user(auth.user_id).await?;
    Ok(Json(projects))
}

/// Issues an invitation token for the project
///
/// # Errors
///
/// - 404 if the project doesn't exist
/// - 403 if the caller isn't a member
pub async fn create_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<InvitationResponse>)> {
    state.members.require_member(project_id, auth.user_id).await?;

    let issued = state
        .members
        .create_invitation(project_id, auth.user_id, state.invitation_ttl())
        .await?;

    state
        .notifier
        .record(ActivityEvent::InvitationCreated {
            project_id,
            invitation_id: issued.invitation.id,
            by: auth.user_id,
        })
        .await;

    let expires_at = issued.expires_at();
    Ok((
        StatusCode::CREATED,
        Json(InvitationResponse {
            invitation_id: issued.invitation.id,
            token: issued.token,
            expires_at,
        }),
    ))
}

/// Redeems an invitation token
///
/// The token alone decides which project is joined; the path id is only
/// logged when it disagrees.
///
/// # Errors
///
/// 400 `invalid_token` for unknown or used tokens, 400 `expired` past the
/// deadline
pub async fn join_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(path_project_id): Path<Uuid>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> ApiResult<Json<JoinResponse>> {
    let Json(req) = payload?;
    let project_id = state
        .members
        .redeem_invitation(&req.token, auth.user_id)
        .await?;

    if project_id != path_project_id {
        debug!(
            path_project_id = %path_project_id,
            project_id = %project_id,
            "Join path does not match the invitation's project"
        );
    }

    state
        .notifier
        .record(ActivityEvent::UserJoined {
            project_id,
            user_id: auth.user_id,
        })
        .await;

    Ok(Json(JoinResponse {
        ok: true,
        project_id,
    }))
}

pub async fn project_report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectReport>> {
    state.members.require_member(project_id, auth.user_id).await?;

    let report = state.reporting.project_report(project_id).await?;
    Ok(Json(report))
}
