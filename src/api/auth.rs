use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::AppState;

/// Bearer-token authentication for user-facing routes.
///
/// If `API_TOKEN` is configured, every request must carry
/// `Authorization: Bearer <token>` matching it. Unset disables the check
/// (dev mode).
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    check_bearer(state.config.api_token.as_deref(), req, next).await
}

/// Same check against `ADMIN_API_TOKEN`, guarding the escrow overview.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    check_bearer(state.config.admin_api_token.as_deref(), req, next).await
}

async fn check_bearer(expected: Option<&str>, req: Request, next: Next) -> Response {
    let Some(expected) = expected else {
        return next.run(req).await;
    };

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    match auth_header.and_then(|v| v.strip_prefix("Bearer ")) {
        Some(token) if token == expected => next.run(req).await,
        Some(_) => (StatusCode::UNAUTHORIZED, "Invalid token").into_response(),
        None => (StatusCode::UNAUTHORIZED, "Missing or invalid Authorization header").into_response(),
    }
}
