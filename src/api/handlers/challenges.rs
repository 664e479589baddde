use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::card::ChallengeCard;
use crate::errors::AppError;
use crate::listing::{transform, SortKey};
use crate::query::QueryKey;
use crate::AppState;

use super::{resolve, respond, ApiResponse};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub search: String,
    pub sort: SortKey,
}

/// GET /api/challenges?search=&sort=: filtered, sorted challenge cards
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<ChallengeCard>>>, AppError> {
    let result = state
        .queries
        .challenges(&state.query_client, &state.platform)
        .await;
    let (challenges, error) = resolve(result)?;

    let now = Utc::now();
    let cards = transform(&challenges, &params.search, params.sort)
        .iter()
        .map(|c| ChallengeCard::from_challenge(c, &state.config.currency_symbol, now))
        .collect();

    Ok(Json(respond(cards, error)))
}

/// POST /api/challenges/{id}/accept: accept a challenge addressed to the caller
pub async fn accept(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.platform.accept_challenge(id).await?;
    state
        .query_client
        .invalidate_many(&[QueryKey::Challenges, QueryKey::AdminEscrow]);

    tracing::info!(challenge_id = id, "Challenge accepted");
    Ok(Json(ApiResponse::ok(())))
}

/// POST /api/challenges/{id}/cancel: cancel a challenge
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.platform.cancel_challenge(id).await?;
    state.query_client.invalidate_many(&[
        QueryKey::Challenges,
        QueryKey::AdminEscrow,
        QueryKey::WalletBalance,
    ]);

    tracing::info!(challenge_id = id, "Challenge cancelled");
    Ok(Json(ApiResponse::ok(())))
}
