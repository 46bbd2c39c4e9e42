//! Bets and their confirmation state machine.
//!
//! ```text
//!                         supplier accepts
//!  PENDING_CONFIRMATION ──────────────────► CONFIRMED
//!           │
//!           │ supplier rejects (or answers anything else)
//!           ▼
//!        REJECTED
//! ```
//!
//! A bet leaves PENDING_CONFIRMATION exactly once. The two terminal states
//! are unreachable from each other.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{BetId, UserId};
use super::money::{ensure_positive_cents, ensure_positive_odd, Cents, Odd};

/// Confirmation state of a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetStatus {
    PendingConfirmation,
    Confirmed,
    Rejected,
}

impl BetStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PendingConfirmation => "PENDING_CONFIRMATION",
            Self::Confirmed => "CONFIRMED",
            Self::Rejected => "REJECTED",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::PendingConfirmation)
    }

    /// Whether `self -> next` is a legal edge of the state machine.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::PendingConfirmation, Self::Confirmed)
                | (Self::PendingConfirmation, Self::Rejected)
        )
    }

    /// Normalize a supplier verdict.
    ///
    /// Only a case-insensitive `CONFIRMED` confirms. Every other answer,
    /// including garbage, is treated as a rejection so that an ambiguous
    /// outcome never keeps the stake.
    #[must_use]
    pub fn from_supplier(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("CONFIRMED") {
            Self::Confirmed
        } else {
            Self::Rejected
        }
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_CONFIRMATION" => Ok(Self::PendingConfirmation),
            "CONFIRMED" => Ok(Self::Confirmed),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(DomainError::UnknownStatus {
                kind: "bet",
                value: other.to_string(),
            }),
        }
    }
}

/// An unvalidated request to stake money on a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub selection: String,
    #[serde(default)]
    pub stake_cents: Cents,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub odd_value: Odd,
}

impl BetRequest {
    /// Check required fields and positivity.
    ///
    /// # Errors
    /// Returns the first violated rule as a [`DomainError`].
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("userId", &self.user_id),
            ("eventId", &self.event_id),
            ("market", &self.market),
            ("selection", &self.selection),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::MissingField { field });
            }
        }
        ensure_positive_cents("stakeCents", self.stake_cents)?;
        ensure_positive_odd(self.odd_value)?;
        Ok(())
    }
}

/// A stored bet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub user_id: UserId,
    pub event_id: String,
    pub market: String,
    pub selection: String,
    pub stake_cents: Cents,
    pub odd_value: Odd,
    pub status: BetStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bet {
    /// Open a new bet awaiting confirmation. The request must already be
    /// validated.
    #[must_use]
    pub fn pending(id: BetId, request: &BetRequest) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: UserId::new(request.user_id.clone()),
            event_id: request.event_id.clone(),
            market: request.market.clone(),
            selection: request.selection.clone(),
            stake_cents: request.stake_cents,
            odd_value: request.odd_value,
            status: BetStatus::PendingConfirmation,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Append-only audit of a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetTransition {
    pub bet_id: BetId,
    pub old_status: BetStatus,
    pub new_status: BetStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BetTransition {
    #[must_use]
    pub fn now(
        bet_id: BetId,
        old_status: BetStatus,
        new_status: BetStatus,
        reason: Option<String>,
    ) -> Self {
        Self {
            bet_id,
            old_status,
            new_status,
            reason,
            created_at: Utc::now(),
        }
    }
}
