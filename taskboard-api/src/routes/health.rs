/// Health check endpoint
///
/// `GET /health` is public. It reports the store backend and whether it is
/// reachable; with PostgreSQL it also reports pool usage.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::Serialize;
use taskboard_shared::store::StoreHealth;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    pub version: String,

    pub store: StoreHealth,

    /// Open live-stream subscriptions
    pub subscribers: usize,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let store = state.store.health().await;

    Ok(Json(HealthResponse {
        status: if store.healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store,
        subscribers: state.notifier.broadcaster().subscriber_count(),
    }))
}
