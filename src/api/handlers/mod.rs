pub mod challenges;
pub mod escrow;
pub mod health;
pub mod join;
pub mod metrics;
pub mod ws;

use serde::Serialize;

use crate::errors::AppError;
use crate::query::QueryState;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Previous data served alongside the error that kept it from refreshing.
    pub fn stale(data: T, error: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: Some(error),
        }
    }
}

/// Read data out of a finished query.
///
/// A failed refresh still serves the last good snapshot, except when the
/// backend refused the caller outright (401/403).
pub(crate) fn resolve<T>(state: QueryState<T>) -> Result<(T, Option<String>), AppError> {
    match state {
        QueryState::Ready { data } => Ok((data, None)),
        QueryState::Failed {
            error,
            status,
            stale,
        } => match (stale, status) {
            (_, Some(401 | 403)) | (None, _) => Err(AppError::upstream(status, error)),
            (Some(data), _) => Ok((data, Some(error))),
        },
        QueryState::Idle | QueryState::Loading => Err(AppError::Internal(anyhow::anyhow!(
            "query finished without a result"
        ))),
    }
}

pub(crate) fn respond<T: Serialize>(data: T, error: Option<String>) -> ApiResponse<T> {
    match error {
        None => ApiResponse::ok(data),
        Some(error) => ApiResponse::stale(data, error),
    }
}
