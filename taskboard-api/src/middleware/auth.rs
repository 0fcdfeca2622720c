/// Bearer-token authentication for `/v1` routes
///
/// The layer resolves `Authorization: Bearer <token>` to a user through
/// [`IdentityService::current_user`](taskboard_shared::services::IdentityService::current_user)
/// and inserts an [`AuthUser`] into the request extensions. Handlers read it
/// with `Extension<AuthUser>`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{app::AppState, error::ApiError};

/// The authenticated caller
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

/// Extracts the token from an `Authorization` header value
fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = bearer_token(auth_header)
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let user = state.identity.current_user(token).await?;

    req.extensions_mut().insert(AuthUser {
        user_id: user.id,
        username: user.username,
    });

    Ok(next.run(req).await)
}
