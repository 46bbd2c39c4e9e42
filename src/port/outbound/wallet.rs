//! Wallet ledger port.
//!
//! Bet placement and the confirmation worker reach the ledger only through
//! this trait. The SQLite ledger implements it directly; the HTTP client
//! implements it for processes that talk to a remote wallet service.

use async_trait::async_trait;

use crate::domain::{Cents, ExternalRef, LedgerEntry, Reservation, ReservationId, UserId, Wallet};
use crate::error::Result;

/// The five saga-facing wallet operations.
///
/// Every operation is atomic and serialized per wallet. Reserve, Commit and
/// Refund are idempotent on `(wallet, external_ref)`.
#[async_trait]
pub trait WalletGateway: Send + Sync {
    /// Fetch the user's wallet, creating an empty one if needed.
    async fn get_or_create_wallet(&self, user_id: &UserId) -> Result<Wallet>;

    /// Credit `amount` and return the updated wallet.
    async fn deposit(
        &self,
        user_id: &UserId,
        amount: Cents,
        external_ref: &ExternalRef,
    ) -> Result<Wallet>;

    /// Withhold `amount` under `external_ref`.
    ///
    /// A repeat call with the same ref returns the existing reservation
    /// without touching the balance.
    async fn reserve(
        &self,
        user_id: &UserId,
        amount: Cents,
        external_ref: &ExternalRef,
    ) -> Result<ReservationId>;

    /// Consume a pending reservation. No-op once settled.
    async fn commit(&self, user_id: &UserId, external_ref: &ExternalRef) -> Result<()>;

    /// Return a pending reservation to the balance. No-op once settled.
    async fn refund(&self, user_id: &UserId, external_ref: &ExternalRef) -> Result<()>;
}

/// Read-only view over the ledger's audit trail.
#[async_trait]
pub trait LedgerAudit: Send + Sync {
    /// Ledger entries for the user's wallet, oldest first.
    async fn entries(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>>;

    /// Reservation held under `external_ref`, if any.
    async fn reservation(
        &self,
        user_id: &UserId,
        external_ref: &ExternalRef,
    ) -> Result<Option<Reservation>>;
}
