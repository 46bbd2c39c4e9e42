//! HTTP servers (axum) for the wallet ledger, bet placement and the
//! supplier simulator.

pub mod bets;
pub mod error;
pub mod supplier;
pub mod wallet;

use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::adapter::wire::StatusResponse;
use crate::error::Result;

pub use error::{ApiError, ApiResult};

async fn healthz() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

/// Bind `addr` and serve `router` until `shutdown` turns true.
///
/// In-flight requests are drained before this returns.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(
    name: &'static str,
    addr: &str,
    router: Router,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_on(name, listener, router, shutdown).await
}

/// Serve `router` on an already bound listener.
///
/// # Errors
/// Returns an error if the server fails.
pub async fn serve_on(
    name: &'static str,
    listener: TcpListener,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    info!(service = name, addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;
    info!(service = name, "Server stopped");
    Ok(())
}
