/// Error handling and HTTP response mapping
///
/// Handlers return [`ApiResult`]. Every [`ApiError`] renders as a JSON body:
///
/// ```json
/// {
///   "error": "invalid_token",
///   "message": "invalid invitation token"
/// }
/// ```
///
/// Domain errors convert via `From<CoreError>`, so handlers can use `?` on
/// service calls.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskboard_shared::store::StoreError;
use taskboard_shared::CoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// 400 - malformed request or unknown status
    BadRequest(String),

    /// 400 - invitation token unknown or already used
    InvalidToken,

    /// 400 - invitation past its deadline
    Expired,

    /// 401 - missing, invalid or expired session
    Unauthorized(String),

    /// 403 - not a member of the project
    Forbidden(String),

    /// 404
    NotFound(String),

    /// 409 - duplicate username
    Conflict(String),

    /// 422 - field validation failed
    ValidationError(Vec<ValidationErrorDetail>),

    /// 500 - details are logged, never returned
    InternalError(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code
    pub error: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::InvalidToken => write!(f, "Invalid invitation token"),
            ApiError::Expired => write!(f, "Invitation expired"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::InvalidToken => (
                StatusCode::BAD_REQUEST,
                "invalid_token",
                "invalid invitation token".to_string(),
                None,
            ),
            ApiError::Expired => (
                StatusCode::BAD_REQUEST,
                "expired",
                "invitation expired".to_string(),
                None,
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            CoreError::InvalidToken => ApiError::InvalidToken,
            CoreError::Expired => ApiError::Expired,
            CoreError::Forbidden(msg) => ApiError::Forbidden(msg),
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
            CoreError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            CoreError::Credential(msg) => ApiError::InternalError(format!("Credential operation failed: {}", msg)),
            CoreError::Store(StoreError::Conflict(what)) => ApiError::Conflict(format!("duplicate {}", what)),
            CoreError::Store(StoreError::InvalidReference(what)) => ApiError::BadRequest(format!("unknown {}", what)),
            CoreError::Store(err) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
