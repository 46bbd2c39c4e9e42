//! Bet placement HTTP surface.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::error::ApiResult;
use super::healthz;
use crate::adapter::wire::BetResponse;
use crate::application::BetPlacement;
use crate::domain::{BetId, BetRequest};
use crate::error::Error;

/// Routes of `serve bets`.
pub fn router(placement: Arc<BetPlacement>) -> Router {
    Router::new()
        .route("/bets", post(place_bet))
        .route("/bets/:bet_id", get(bet_status))
        .route("/healthz", get(healthz))
        .with_state(placement)
}

async fn place_bet(
    State(placement): State<Arc<BetPlacement>>,
    body: Result<Json<BetRequest>, JsonRejection>,
) -> ApiResult<Json<BetResponse>> {
    let Json(request) = body?;
    let placed = placement.place(request).await?;
    Ok(Json(BetResponse {
        bet_id: placed.bet_id,
        status: placed.status,
    }))
}

async fn bet_status(
    State(placement): State<Arc<BetPlacement>>,
    Path(bet_id): Path<String>,
) -> ApiResult<Json<BetResponse>> {
    let bet_id = BetId::from(bet_id);
    let bet = placement
        .status(&bet_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            kind: "bet",
            id: bet_id.to_string(),
        })?;
    Ok(Json(BetResponse {
        bet_id: bet.id,
        status: bet.status,
    }))
}
