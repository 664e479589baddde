use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Map, Value};

use crate::AppState;

/// Liveness only; the platform backend is not called. Cache states come
/// from what is already held in memory.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let open_sessions = state.sessions.len().await;
    let queries: Map<String, Value> = state
        .queries
        .cache_states()
        .await
        .into_iter()
        .map(|(key, label)| (key.to_string(), Value::from(label)))
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "open_join_sessions": open_sessions,
            "queries": queries,
        })),
    )
}
