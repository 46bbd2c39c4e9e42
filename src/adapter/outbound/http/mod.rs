//! reqwest clients for the wallet service and the supplier.

pub mod supplier;
pub mod wallet;

pub use supplier::HttpSupplier;
pub use wallet::HttpWalletClient;

use std::time::Duration;

use reqwest::{Client as HttpClient, Response};
use url::Url;

use crate::adapter::wire::ApiErrorBody;
use crate::error::Result;

/// Build a client with request and connect timeouts.
pub(crate) fn build_client(timeout: Duration) -> Result<HttpClient> {
    Ok(HttpClient::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?)
}

/// Append `path` to `base`, keeping any path prefix on the base.
pub(crate) fn endpoint(base: &Url, path: &str) -> Url {
    let mut joined = base.clone();
    let prefix = base.path().trim_end_matches('/');
    joined.set_path(&format!("{prefix}{path}"));
    joined
}

/// Read an error body, tolerating servers that answer with plain text.
pub(crate) async fn error_body(response: Response) -> ApiErrorBody {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str(&text).unwrap_or(ApiErrorBody {
        error: String::new(),
        message: text,
        current_odd: None,
    })
}
