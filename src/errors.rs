use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::join::JoinError;
use crate::platform::PlatformError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The platform backend refused or failed the call.
    #[error("Upstream error: {message}")]
    Upstream { status: StatusCode, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Upstream { status, message } => (*status, message.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

impl AppError {
    /// Authorization failures keep their status so the dashboard can tell
    /// them apart from an outage; everything else is a bad gateway.
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        let status = match status {
            Some(401) => StatusCode::UNAUTHORIZED,
            Some(403) => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_GATEWAY,
        };
        AppError::Upstream {
            status,
            message: message.into(),
        }
    }
}

impl From<PlatformError> for AppError {
    fn from(e: PlatformError) -> Self {
        AppError::upstream(e.status(), e.to_string())
    }
}

impl From<JoinError> for AppError {
    fn from(e: JoinError) -> Self {
        match e {
            JoinError::Invalid(v) => AppError::BadRequest(v.to_string()),
            JoinError::Busy { .. } => AppError::Conflict(e.to_string()),
            JoinError::Closed => AppError::NotFound(e.to_string()),
            JoinError::Platform(p) => p.into(),
            JoinError::BalanceUnavailable { status, message } => {
                AppError::upstream(status, message)
            }
        }
    }
}
