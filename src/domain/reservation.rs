//! Reservations: holds on wallet funds pending an external decision.
//!
//! ```text
//!            commit
//!  PENDING ─────────► COMMITTED
//!     │
//!     │ refund
//!     ▼
//!  REFUNDED
//! ```
//!
//! Both outcomes are terminal. Settling an already-settled reservation is
//! a no-op, which is what makes Commit and Refund safe to repeat.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{ExternalRef, ReservationId, WalletId};
use super::money::Cents;
use super::wallet::OperationType;

/// Lifecycle state of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Committed,
    Refunded,
}

impl ReservationStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Committed => "COMMITTED",
            Self::Refunded => "REFUNDED",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMMITTED" => Ok(Self::Committed),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(DomainError::UnknownStatus {
                kind: "reservation",
                value: other.to_string(),
            }),
        }
    }
}

/// How a pending reservation is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Funds are consumed; balance is unchanged.
    Commit,
    /// Funds go back to the wallet.
    Refund,
}

impl Settlement {
    #[must_use]
    pub const fn target(&self) -> ReservationStatus {
        match self {
            Self::Commit => ReservationStatus::Committed,
            Self::Refund => ReservationStatus::Refunded,
        }
    }

    /// Ledger operation recorded when the settlement applies.
    #[must_use]
    pub const fn operation(&self) -> OperationType {
        match self {
            Self::Commit => OperationType::Debit,
            Self::Refund => OperationType::Refund,
        }
    }

    /// Amount returned to the available balance.
    #[must_use]
    pub const fn balance_delta(&self, amount: Cents) -> Cents {
        match self {
            Self::Commit => 0,
            Self::Refund => amount,
        }
    }
}

/// A hold on wallet funds keyed by `(wallet_id, external_ref)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub wallet_id: WalletId,
    pub external_ref: ExternalRef,
    pub amount_cents: Cents,
    pub status: ReservationStatus,
}

impl Reservation {
    /// A new pending hold.
    #[must_use]
    pub fn hold(wallet_id: WalletId, external_ref: ExternalRef, amount_cents: Cents) -> Self {
        Self {
            id: ReservationId::generate(),
            wallet_id,
            external_ref,
            amount_cents,
            status: ReservationStatus::Pending,
        }
    }

    /// Apply a settlement.
    ///
    /// Returns `true` when the reservation moved out of PENDING, `false`
    /// when it was already terminal and nothing changed.
    pub fn settle(&mut self, settlement: Settlement) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = settlement.target();
        true
    }
}
