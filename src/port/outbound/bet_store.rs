//! Persistence port for bets and their transition audit.

use async_trait::async_trait;

use crate::domain::{Bet, BetId, BetStatus, BetTransition};
use crate::error::Result;

/// Result of a conditional status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The bet moved out of PENDING_CONFIRMATION.
    Applied,
    /// Another writer got there first; carries the stored status.
    AlreadyTerminal(BetStatus),
    /// No such bet.
    NotFound,
}

/// Storage operations for bets.
#[async_trait]
pub trait BetStore: Send + Sync {
    /// Insert a new bet row.
    async fn insert(&self, bet: &Bet) -> Result<()>;

    /// Get a bet by ID.
    async fn get(&self, id: &BetId) -> Result<Option<Bet>>;

    /// Move a pending bet to `next`. Only rows still in
    /// PENDING_CONFIRMATION are touched.
    async fn transition(&self, id: &BetId, next: BetStatus) -> Result<TransitionOutcome>;

    /// Append an audit row.
    async fn record_transition(&self, transition: &BetTransition) -> Result<()>;

    /// Audit rows for a bet, oldest first.
    async fn transitions(&self, id: &BetId) -> Result<Vec<BetTransition>>;
}
