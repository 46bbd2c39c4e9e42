//! Bet placement service.
//!
//! Takes a bet in: validates it, checks the quoted odd, opens the bet row,
//! reserves the stake and announces the bet on the bus. Placement only
//! acknowledges intake; the verdict arrives later through the
//! confirmation worker.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{Bet, BetId, BetPlaced, BetRequest, BetStatus, Topics};
use crate::error::{Error, LedgerError, PlacementError, Result};
use crate::port::outbound::{
    publish_json, BetStore, EventPublisher, OddsCache, OddsKey, WalletGateway,
};

/// Acknowledgement returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedBet {
    pub bet_id: BetId,
    pub status: BetStatus,
}

/// PlaceBet use case.
pub struct BetPlacement {
    bets: Arc<dyn BetStore>,
    wallet: Arc<dyn WalletGateway>,
    publisher: Arc<dyn EventPublisher>,
    odds: Arc<dyn OddsCache>,
    topics: Topics,
}

impl BetPlacement {
    pub fn new(
        bets: Arc<dyn BetStore>,
        wallet: Arc<dyn WalletGateway>,
        publisher: Arc<dyn EventPublisher>,
        odds: Arc<dyn OddsCache>,
        topics: Topics,
    ) -> Self {
        Self {
            bets,
            wallet,
            publisher,
            odds,
            topics,
        }
    }

    /// Take a bet in.
    ///
    /// Steps run in a fixed order and stop at the first failure:
    /// validation, odd check, bet row, reservation, announcement.
    ///
    /// A failed reservation does not remove the bet row. The bet then stays
    /// in PENDING_CONFIRMATION with no stake held, and no event is
    /// published for it.
    ///
    /// # Errors
    /// - [`Error::Domain`] when the request is malformed.
    /// - [`PlacementError::OddChanged`] when the cache quotes another odd.
    /// - [`LedgerError::InsufficientFunds`] when the wallet cannot cover the
    ///   stake, [`PlacementError::ReserveFailed`] for any other wallet failure.
    pub async fn place(&self, request: BetRequest) -> Result<PlacedBet> {
        request.validate()?;
        self.check_odd(&request).await?;

        let bet = Bet::pending(BetId::generate(), &request);
        self.bets.insert(&bet).await?;
        debug!(bet_id = %bet.id, user_id = %bet.user_id, "Bet row opened");

        let reserved_ref = bet.id.reservation_ref();
        if let Err(err) = self
            .wallet
            .reserve(&bet.user_id, bet.stake_cents, &reserved_ref)
            .await
        {
            warn!(
                bet_id = %bet.id,
                user_id = %bet.user_id,
                stake_cents = bet.stake_cents,
                error = %err,
                "Stake reservation failed, bet left pending without funds"
            );
            return Err(match err {
                Error::Ledger(LedgerError::InsufficientFunds { .. }) => err,
                other => PlacementError::ReserveFailed {
                    bet_id: bet.id.to_string(),
                    reason: other.to_string(),
                }
                .into(),
            });
        }

        let event = BetPlaced::from_bet(&bet, reserved_ref);
        if let Err(err) = publish_json(
            self.publisher.as_ref(),
            &self.topics.bet_placed,
            bet.id.as_str(),
            &event,
        )
        .await
        {
            warn!(
                bet_id = %bet.id,
                topic = %self.topics.bet_placed,
                error = %err,
                "Failed to announce bet"
            );
        }

        info!(
            bet_id = %bet.id,
            user_id = %bet.user_id,
            stake_cents = bet.stake_cents,
            odd = %bet.odd_value,
            "Bet accepted for confirmation"
        );
        Ok(PlacedBet {
            bet_id: bet.id,
            status: bet.status,
        })
    }

    /// Look a bet up.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub async fn status(&self, bet_id: &BetId) -> Result<Option<Bet>> {
        self.bets.get(bet_id).await
    }

    async fn check_odd(&self, request: &BetRequest) -> Result<()> {
        let key = OddsKey::new(&request.event_id, &request.market, &request.selection);
        match self.odds.current_odd(&key).await {
            Ok(Some(current)) if current != request.odd_value => {
                info!(
                    key = %key,
                    submitted = %request.odd_value,
                    current = %current,
                    "Submitted odd is stale"
                );
                Err(PlacementError::OddChanged {
                    submitted: request.odd_value,
                    current,
                }
                .into())
            }
            Ok(_) => Ok(()),
            Err(err) => {
                debug!(key = %key, error = %err, "Odds cache unavailable, trusting submitted odd");
                Ok(())
            }
        }
    }
}
