use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Request-terminal failures. Every variant maps to exactly one status
/// code; nothing is retried and nothing is swallowed.
#[derive(Debug)]
pub enum ApiError {
    /// Missing/empty fields or a duplicate username. 400.
    Validation(String),
    /// Missing, malformed, or unknown bearer token; bad login credentials. 401.
    Unauthorized,
    /// Authenticated, but acting on another user's record. 403.
    Forbidden,
    /// Unknown identifier. 404.
    NotFound,
    /// Storage layer failure. 500.
    Database(sqlx::Error),
    /// Non-storage server fault, e.g. the password hasher refusing input. 500.
    Internal(&'static str),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Database(err) => {
                tracing::error!(error = %err, "database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
            ApiError::Internal(what) => {
                tracing::error!(what, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
