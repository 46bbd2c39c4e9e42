//! Supplier port: the external authority that confirms or rejects bets.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BetId, BetPlaced, Cents, Odd, UserId};
use crate::error::Result;

/// Body of `POST /supplier/confirm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub bet_id: BetId,
    pub user_id: UserId,
    pub event_id: String,
    pub stake_cents: Cents,
    #[serde(with = "rust_decimal::serde::float")]
    pub odd_value: Odd,
}

impl From<&BetPlaced> for ConfirmRequest {
    fn from(event: &BetPlaced) -> Self {
        Self {
            bet_id: event.bet_id.clone(),
            user_id: event.user_id.clone(),
            event_id: event.event_id.clone(),
            stake_cents: event.stake_cents,
            odd_value: event.odd_value,
        }
    }
}

/// Supplier verdict. `status` is raw; callers normalize it with
/// [`crate::domain::BetStatus::from_supplier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub provider_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Confirms bets with the external party.
#[async_trait]
pub trait Supplier: Send + Sync {
    /// Ask the supplier for a verdict on one bet.
    async fn confirm(&self, request: &ConfirmRequest) -> Result<ConfirmResponse>;
}
