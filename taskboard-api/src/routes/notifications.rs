/// Notification endpoints and the live activity stream
///
/// `GET /v1/notifications/stream` is a Server-Sent Events stream:
///
/// 1. the subscription is registered before anything else, so no event
///    published while the backlog loads is lost
/// 2. an `init` event carries the caller's stored notifications as a JSON array
/// 3. every published activity of a project the caller belongs to follows as
///    an event named after its `type`; membership is checked when the event
///    is delivered
///
/// Dropping the connection drops the stream, which unregisters the queue.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthUser,
};
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use taskboard_shared::{
    events::ActivityEvent, models::notification::Notification, services::MembershipManager,
    CoreError,
};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub ok: bool,
}

/// Lists the caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<Vec<Notification>>> {
    let notifications = state
        .store
        .list_notifications(auth.user_id)
        .await
        .map_err(CoreError::from)?;
    Ok(Json(notifications))
}

/// Marks one of the caller's notifications read
///
/// Another user's notification is reported as not found.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<Json<MarkReadResponse>> {
    let updated = state
        .store
        .mark_notification_read(notification_id, auth.user_id)
        .await
        .map_err(CoreError::from)?;

    if !updated {
        return Err(ApiError::NotFound("notification not found".to_string()));
    }
    Ok(Json(MarkReadResponse { ok: true }))
}

/// Builds a named SSE event with a JSON body
fn json_event(name: &str, payload: &impl Serialize) -> Event {
    Event::default()
        .event(name)
        .json_data(payload)
        .unwrap_or_else(|e| {
            warn!(error = %e, event = name, "Failed to encode stream event");
            Event::default().event(name).data("null")
        })
}

/// True if `user_id` is currently a member of the event's project
async fn visible_to(members: &MembershipManager, event: &ActivityEvent, user_id: Uuid) -> bool {
    match members.is_member(event.project_id(), user_id).await {
        Ok(member) => member,
        Err(e) => {
            warn!(error = %e, user_id = %user_id, "Membership check failed, event withheld");
            false
        }
    }
}

pub async fn stream_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let subscription = state.notifier.subscribe();

    let backlog = state
        .store
        .list_notifications(auth.user_id)
        .await
        .map_err(CoreError::from)?;

    info!(
        user_id = %auth.user_id,
        subscriber_id = subscription.id(),
        backlog = backlog.len(),
        "Activity stream opened"
    );

    let init = json_event("init", &backlog);
    let members = state.members.clone();
    let user_id = auth.user_id;
    let live = subscription.into_stream().filter_map(move |event| {
        let members = members.clone();
        async move {
            visible_to(&members, &event, user_id)
                .await
                .then(|| Ok::<_, Infallible>(json_event(event.event_type(), &event)))
        }
    });
    let stream = stream::once(async move { Ok::<_, Infallible>(init) }).chain(live);

    let keep_alive = KeepAlive::new()
        .interval(Duration::from_secs(state.config.stream.keep_alive_seconds))
        .text("keep-alive");

    Ok(Sse::new(stream).keep_alive(keep_alive))
}
