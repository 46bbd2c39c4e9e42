//! Wallet ledger HTTP surface.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::error::ApiResult;
use super::healthz;
use crate::adapter::wire::{
    AmountRequest, LedgerEntryView, ReservationResponse, SettleRequest, StatusResponse,
    UserQuery, WalletResponse,
};
use crate::domain::{ExternalRef, ReservationStatus, UserId};
use crate::port::outbound::{LedgerAudit, WalletGateway};

#[derive(Clone)]
struct WalletState {
    gateway: Arc<dyn WalletGateway>,
    audit: Arc<dyn LedgerAudit>,
}

/// Routes of `serve wallet`.
pub fn router(gateway: Arc<dyn WalletGateway>, audit: Arc<dyn LedgerAudit>) -> Router {
    Router::new()
        .route("/wallet", get(get_wallet))
        .route("/wallet/deposit", post(deposit))
        .route("/wallet/reserve", post(reserve))
        .route("/wallet/commit", post(commit))
        .route("/wallet/refund", post(refund))
        .route("/wallet/ledger", get(ledger))
        .route("/healthz", get(healthz))
        .with_state(WalletState { gateway, audit })
}

async fn get_wallet(
    State(state): State<WalletState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Json<WalletResponse>> {
    let Query(query) = query?;
    let wallet = state
        .gateway
        .get_or_create_wallet(&UserId::new(query.user_id))
        .await?;
    Ok(Json(wallet.into()))
}

async fn deposit(
    State(state): State<WalletState>,
    body: Result<Json<AmountRequest>, JsonRejection>,
) -> ApiResult<Json<WalletResponse>> {
    let Json(body) = body?;
    let wallet = state
        .gateway
        .deposit(
            &UserId::new(body.user_id),
            body.amount_cents,
            &ExternalRef::new(body.external_ref),
        )
        .await?;
    Ok(Json(wallet.into()))
}

async fn reserve(
    State(state): State<WalletState>,
    body: Result<Json<AmountRequest>, JsonRejection>,
) -> ApiResult<Json<ReservationResponse>> {
    let Json(body) = body?;
    let user_id = UserId::new(body.user_id);
    let external_ref = ExternalRef::new(body.external_ref);
    let reservation_id = state
        .gateway
        .reserve(&user_id, body.amount_cents, &external_ref)
        .await?;
    // A repeated reserve may hit a reservation that has since settled.
    let status = state
        .audit
        .reservation(&user_id, &external_ref)
        .await?
        .map_or(ReservationStatus::Pending, |reservation| reservation.status);
    Ok(Json(ReservationResponse {
        reservation_id,
        status: status.as_str().to_string(),
    }))
}

async fn commit(
    State(state): State<WalletState>,
    body: Result<Json<SettleRequest>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Json(body) = body?;
    state
        .gateway
        .commit(
            &UserId::new(body.user_id),
            &ExternalRef::new(body.external_ref),
        )
        .await?;
    Ok(Json(StatusResponse::ok()))
}

async fn refund(
    State(state): State<WalletState>,
    body: Result<Json<SettleRequest>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Json(body) = body?;
    state
        .gateway
        .refund(
            &UserId::new(body.user_id),
            &ExternalRef::new(body.external_ref),
        )
        .await?;
    Ok(Json(StatusResponse::ok()))
}

async fn ledger(
    State(state): State<WalletState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<LedgerEntryView>>> {
    let Query(query) = query?;
    let entries = state.audit.entries(&UserId::new(query.user_id)).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
