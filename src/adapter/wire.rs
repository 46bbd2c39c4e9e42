//! JSON bodies shared by the HTTP servers and the HTTP clients.
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    BetId, BetStatus, Cents, ExternalRef, LedgerEntry, Odd, OperationType, ReservationId, UserId,
    Wallet, WalletId,
};

/// `?userId=` query string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: String,
}

/// Body of `POST /wallet/deposit` and `POST /wallet/reserve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub amount_cents: Cents,
    #[serde(default)]
    pub external_ref: String,
}

/// Body of `POST /wallet/commit` and `POST /wallet/refund`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub external_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub user_id: UserId,
    pub wallet_id: WalletId,
    pub balance_cents: Cents,
    #[serde(default)]
    pub version: i64,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            user_id: wallet.user_id,
            wallet_id: wallet.id,
            balance_cents: wallet.balance_cents,
            version: wallet.version,
        }
    }
}

impl From<WalletResponse> for Wallet {
    fn from(body: WalletResponse) -> Self {
        Self {
            id: body.wallet_id,
            user_id: body.user_id,
            balance_cents: body.balance_cents,
            version: body.version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub reservation_id: ReservationId,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}

/// One row of `GET /wallet/ledger`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryView {
    pub operation: OperationType,
    pub amount_cents: Cents,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for LedgerEntryView {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            operation: entry.operation,
            amount_cents: entry.amount_cents,
            description: entry.description,
            created_at: entry.created_at,
        }
    }
}

/// Reply of `POST /bets` and `GET /bets/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetResponse {
    pub bet_id: BetId,
    pub status: BetStatus,
}

/// Error body returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// Machine-readable reason, e.g. `insufficient_funds`.
    pub error: String,
    #[serde(default)]
    pub message: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub current_odd: Option<Odd>,
}

impl AmountRequest {
    #[must_use]
    pub fn new(user_id: &UserId, amount_cents: Cents, external_ref: &ExternalRef) -> Self {
        Self {
            user_id: user_id.to_string(),
            amount_cents,
            external_ref: external_ref.to_string(),
        }
    }
}

impl SettleRequest {
    #[must_use]
    pub fn new(user_id: &UserId, external_ref: &ExternalRef) -> Self {
        Self {
            user_id: user_id.to_string(),
            external_ref: external_ref.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn error_body_carries_current_odd_as_number() {
        let body = ApiErrorBody {
            error: "odd_changed".into(),
            message: "odd changed".into(),
            current_odd: Some(dec!(2.1)),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["currentOdd"], 2.1);
    }

    #[test]
    fn error_body_omits_missing_odd() {
        let body = ApiErrorBody {
            error: "insufficient_funds".into(),
            message: String::new(),
            current_odd: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("currentOdd").is_none());
    }

    #[test]
    fn amount_request_tolerates_missing_ref() {
        let req: AmountRequest =
            serde_json::from_str(r#"{"userId":"alice","amountCents":1000}"#).unwrap();
        assert_eq!(req.external_ref, "");
    }
}
