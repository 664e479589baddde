use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;

use crate::errors::AppError;
use crate::escrow::{EscrowBoard, EscrowView};
use crate::AppState;

use super::{resolve, respond, ApiResponse};

/// GET /api/admin/escrow?search=&sort=&expanded=: escrow overview
///
/// The board state travels in the query string; nothing here refetches when
/// it changes, the cached overview is reprojected instead.
pub async fn overview(
    State(state): State<AppState>,
    Query(board): Query<EscrowBoard>,
) -> Result<Json<ApiResponse<EscrowView>>, AppError> {
    let result = state
        .queries
        .admin_escrow(&state.query_client, &state.platform)
        .await;
    let (payload, error) = resolve(result)?;

    let view = board.view(&payload, &state.config.currency_symbol, Utc::now());
    Ok(Json(respond(view, error)))
}
