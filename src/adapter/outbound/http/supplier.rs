//! HTTP client for the supplier's confirm endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::debug;
use url::Url;

use super::{build_client, endpoint, error_body};
use crate::error::{Error, Result};
use crate::port::outbound::{ConfirmRequest, ConfirmResponse, Supplier};

/// [`Supplier`] reached over `POST /supplier/confirm`.
pub struct HttpSupplier {
    http: HttpClient,
    base_url: Url,
}

impl HttpSupplier {
    /// Create a client for the supplier at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: Url::parse(base_url)?,
        })
    }
}

#[async_trait]
impl Supplier for HttpSupplier {
    async fn confirm(&self, request: &ConfirmRequest) -> Result<ConfirmResponse> {
        let url = endpoint(&self.base_url, "/supplier/confirm");
        let response = self.http.post(url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(Error::Upstream {
                service: "supplier",
                status: status.as_u16(),
                message: body.message,
            });
        }
        let verdict: ConfirmResponse = response.json().await?;
        debug!(bet_id = %request.bet_id, status = %verdict.status, "Supplier answered");
        Ok(verdict)
    }
}
