//! Wallet balances and the append-only ledger trail.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{UserId, WalletId};
use super::money::Cents;
use crate::error::LedgerError;

/// A user's wallet.
///
/// `balance_cents` is the available balance: reserved stakes are already
/// subtracted. `version` counts balance mutations for audit only; it is
/// not used for conflict detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: UserId,
    pub balance_cents: Cents,
    pub version: i64,
}

impl Wallet {
    /// A fresh zero-balance wallet.
    #[must_use]
    pub fn open(user_id: UserId) -> Self {
        Self {
            id: WalletId::generate(),
            user_id,
            balance_cents: 0,
            version: 1,
        }
    }

    /// Add funds.
    ///
    /// # Errors
    /// Returns [`LedgerError::BalanceOverflow`] when the new balance would
    /// not fit in [`Cents`]. The wallet is left untouched.
    pub fn credit(&mut self, amount: Cents) -> Result<(), LedgerError> {
        self.balance_cents = self
            .balance_cents
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { requested: amount })?;
        self.version += 1;
        Ok(())
    }

    /// Withhold funds, refusing to go below zero.
    ///
    /// # Errors
    /// Returns [`LedgerError::InsufficientFunds`] when the balance cannot
    /// cover `amount`. The wallet is left untouched.
    pub fn debit(&mut self, amount: Cents) -> Result<(), LedgerError> {
        if self.balance_cents < amount {
            return Err(LedgerError::InsufficientFunds { requested: amount });
        }
        self.balance_cents -= amount;
        self.version += 1;
        Ok(())
    }
}

/// Kind of money movement recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    /// Deposit into the wallet.
    Credit,
    /// Reserved funds permanently consumed.
    Debit,
    /// Funds withheld pending an external decision.
    Reserve,
    /// Reserved funds returned.
    Refund,
}

impl OperationType {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "CREDIT",
            Self::Debit => "DEBIT",
            Self::Reserve => "RESERVE",
            Self::Refund => "REFUND",
        }
    }

    /// Prefix used in ledger descriptions, e.g. `reserve:bet-1`.
    #[must_use]
    pub const fn description_prefix(&self) -> &'static str {
        match self {
            Self::Credit => "deposit",
            Self::Debit => "commit",
            Self::Reserve => "reserve",
            Self::Refund => "refund",
        }
    }

    /// Build the audit description for an operation keyed by `external_ref`.
    #[must_use]
    pub fn describe(&self, external_ref: &str) -> String {
        format!("{}:{}", self.description_prefix(), external_ref)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREDIT" => Ok(Self::Credit),
            "DEBIT" => Ok(Self::Debit),
            "RESERVE" => Ok(Self::Reserve),
            "REFUND" => Ok(Self::Refund),
            other => Err(DomainError::UnknownStatus {
                kind: "ledger operation",
                value: other.to_string(),
            }),
        }
    }
}

/// One append-only audit row. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub wallet_id: WalletId,
    pub operation: OperationType,
    pub amount_cents: Cents,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
