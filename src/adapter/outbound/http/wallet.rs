//! HTTP client for a remote wallet ledger.
//!
//! Maps the service's status codes back onto ledger errors: 404 becomes
//! [`LedgerError::NotFound`], a 409 `insufficient_funds` or
//! `balance_overflow` becomes the matching ledger error, everything else
//! non-2xx becomes [`Error::Upstream`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{build_client, endpoint, error_body};
use crate::adapter::wire::{
    AmountRequest, ReservationResponse, SettleRequest, StatusResponse, WalletResponse,
};
use crate::domain::{Cents, ExternalRef, ReservationId, UserId, Wallet};
use crate::error::{Error, LedgerError, Result};
use crate::port::outbound::WalletGateway;

const SERVICE: &str = "wallet";

/// What a failed call was about, for error mapping.
struct CallContext<'a> {
    external_ref: Option<&'a ExternalRef>,
    requested: Option<Cents>,
}

/// [`WalletGateway`] over the wallet service's HTTP surface.
pub struct HttpWalletClient {
    http: HttpClient,
    base_url: Url,
}

impl HttpWalletClient {
    /// Create a client for the wallet service at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: Url::parse(base_url)?,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: CallContext<'_>,
    ) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = error_body(response).await;
        debug!(status = status.as_u16(), error = %body.error, "Wallet call failed");
        match status {
            StatusCode::NOT_FOUND => Err(LedgerError::NotFound {
                external_ref: context
                    .external_ref
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            }
            .into()),
            StatusCode::CONFLICT if body.error == "insufficient_funds" => {
                Err(LedgerError::InsufficientFunds {
                    requested: context.requested.unwrap_or_default(),
                }
                .into())
            }
            StatusCode::CONFLICT if body.error == "balance_overflow" => {
                Err(LedgerError::BalanceOverflow {
                    requested: context.requested.unwrap_or_default(),
                }
                .into())
            }
            _ => Err(Error::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                message: if body.message.is_empty() {
                    body.error
                } else {
                    body.message
                },
            }),
        }
    }
}

#[async_trait]
impl WalletGateway for HttpWalletClient {
    async fn get_or_create_wallet(&self, user_id: &UserId) -> Result<Wallet> {
        let url = endpoint(&self.base_url, "/wallet");
        let request = self.http.get(url).query(&[("userId", user_id.as_str())]);
        let body: WalletResponse = self
            .send(
                request,
                CallContext {
                    external_ref: None,
                    requested: None,
                },
            )
            .await?;
        Ok(body.into())
    }

    async fn deposit(
        &self,
        user_id: &UserId,
        amount: Cents,
        external_ref: &ExternalRef,
    ) -> Result<Wallet> {
        let url = endpoint(&self.base_url, "/wallet/deposit");
        let request = self
            .http
            .post(url)
            .json(&AmountRequest::new(user_id, amount, external_ref));
        let body: WalletResponse = self
            .send(
                request,
                CallContext {
                    external_ref: Some(external_ref),
                    requested: Some(amount),
                },
            )
            .await?;
        Ok(body.into())
    }

    async fn reserve(
        &self,
        user_id: &UserId,
        amount: Cents,
        external_ref: &ExternalRef,
    ) -> Result<ReservationId> {
        let url = endpoint(&self.base_url, "/wallet/reserve");
        let request = self
            .http
            .post(url)
            .json(&AmountRequest::new(user_id, amount, external_ref));
        let body: ReservationResponse = self
            .send(
                request,
                CallContext {
                    external_ref: Some(external_ref),
                    requested: Some(amount),
                },
            )
            .await?;
        Ok(body.reservation_id)
    }

    async fn commit(&self, user_id: &UserId, external_ref: &ExternalRef) -> Result<()> {
        let url = endpoint(&self.base_url, "/wallet/commit");
        let request = self
            .http
            .post(url)
            .json(&SettleRequest::new(user_id, external_ref));
        let _: StatusResponse = self
            .send(
                request,
                CallContext {
                    external_ref: Some(external_ref),
                    requested: None,
                },
            )
            .await?;
        Ok(())
    }

    async fn refund(&self, user_id: &UserId, external_ref: &ExternalRef) -> Result<()> {
        let url = endpoint(&self.base_url, "/wallet/refund");
        let request = self
            .http
            .post(url)
            .json(&SettleRequest::new(user_id, external_ref));
        let _: StatusResponse = self
            .send(
                request,
                CallContext {
                    external_ref: Some(external_ref),
                    requested: None,
                },
            )
            .await?;
        Ok(())
    }
}
