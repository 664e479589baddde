use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::join::{JoinError, JoinSession, JoinSessionView};
use crate::models::{JoinOutcome, Side};
use crate::query::QueryState;
use crate::AppState;

use super::ApiResponse;

#[derive(Deserialize)]
pub struct OpenSessionRequest {
    /// Pre-filled amount; defaults to the challenge's own stake when absent.
    pub stake_amount: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateSessionRequest {
    pub side: Option<Side>,
    pub amount: Option<i64>,
}

#[derive(Serialize)]
pub struct SubmitResult {
    pub outcome: JoinOutcome,
    pub message: String,
    pub session: JoinSessionView,
}

async fn find_session(state: &AppState, sid: Uuid) -> Result<Arc<JoinSession>, AppError> {
    state
        .sessions
        .get(&sid)
        .await
        .ok_or_else(|| AppError::NotFound("join session not found".into()))
}

/// POST /api/challenges/{id}/join-sessions: open the join modal for a challenge
pub async fn open(
    State(state): State<AppState>,
    Path(challenge_id): Path<i64>,
    Json(body): Json<OpenSessionRequest>,
) -> Result<Json<ApiResponse<JoinSessionView>>, AppError> {
    let default_amount = match body.stake_amount {
        Some(amount) => amount,
        None => {
            let result = state
                .queries
                .challenges(&state.query_client, &state.platform)
                .await;
            result
                .data()
                .and_then(|all| all.iter().find(|c| c.id == challenge_id))
                .map(|c| c.stake_amount)
                .ok_or_else(|| AppError::NotFound(format!("challenge {challenge_id} not found")))?
        }
    };

    let session = state.sessions.open(challenge_id, default_amount).await;
    Ok(Json(ApiResponse::ok(session.view().await)))
}

/// GET /api/join-sessions/{sid}
pub async fn get(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<ApiResponse<JoinSessionView>>, AppError> {
    let session = find_session(&state, sid).await?;
    Ok(Json(ApiResponse::ok(session.view().await)))
}

/// PUT /api/join-sessions/{sid}: change the selected side and amount
pub async fn update(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(body): Json<UpdateSessionRequest>,
) -> Result<Json<ApiResponse<JoinSessionView>>, AppError> {
    let session = find_session(&state, sid).await?;
    session.select(body.side, body.amount).await?;
    Ok(Json(ApiResponse::ok(session.view().await)))
}

/// DELETE /api/join-sessions/{sid}: the modal was dismissed
pub async fn close(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !state.sessions.close(&sid).await {
        return Err(AppError::NotFound("join session not found".into()));
    }
    Ok(Json(ApiResponse::ok(())))
}

/// POST /api/join-sessions/{sid}/submit: issue the join call
pub async fn submit(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<ApiResponse<SubmitResult>>, AppError> {
    let session = find_session(&state, sid).await?;

    let balance = async {
        match state
            .queries
            .wallet_balance(&state.query_client, &state.platform)
            .await
        {
            QueryState::Ready { data } => Ok(data),
            QueryState::Failed { error, status, .. } => Err(JoinError::BalanceUnavailable {
                status,
                message: error,
            }),
            QueryState::Idle | QueryState::Loading => Err(JoinError::BalanceUnavailable {
                status: None,
                message: "wallet balance unavailable".into(),
            }),
        }
    };

    let outcome = session
        .submit_with(&state.platform, &state.query_client, balance)
        .await?;

    Ok(Json(ApiResponse::ok(SubmitResult {
        message: outcome.message(),
        outcome,
        session: session.view().await,
    })))
}
