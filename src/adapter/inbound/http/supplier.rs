//! Supplier simulator HTTP surface.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::error::ApiResult;
use super::healthz;
use crate::port::outbound::{ConfirmRequest, ConfirmResponse, Supplier};

/// Routes of `serve supplier`.
pub fn router(supplier: Arc<dyn Supplier>) -> Router {
    Router::new()
        .route("/supplier/confirm", post(confirm))
        .route("/healthz", get(healthz))
        .with_state(supplier)
}

async fn confirm(
    State(supplier): State<Arc<dyn Supplier>>,
    body: Result<Json<ConfirmRequest>, JsonRejection>,
) -> ApiResult<Json<ConfirmResponse>> {
    let Json(request) = body?;
    Ok(Json(supplier.confirm(&request).await?))
}
