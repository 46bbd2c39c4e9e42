//! Confirmation worker.
//!
//! Consumes `bet_placed` one message at a time and settles each bet with
//! the supplier:
//!
//! 1. ask the supplier, retrying with linear backoff; on exhaustion the
//!    payload goes to the dead-letter topic and the bet stays pending
//! 2. normalize the verdict (anything but CONFIRMED rejects)
//! 3. move the bet to its terminal status
//! 4. append an audit row (best effort)
//! 5. refund the stake on rejection, commit it on confirmation (logged
//!    only on failure)
//! 6. publish `bet_confirmed`
//!
//! A message is committed on the bus only after its step has fully run.
//! Persistence failures leave it uncommitted so it comes back; a bet that
//! is already terminal on redelivery replays steps 5 and 6 without asking
//! the supplier again.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::domain::{BetConfirmed, BetPlaced, BetStatus, BetTransition, Topics};
use crate::error::{Error, Result};
use crate::port::outbound::{
    publish_json, BetStore, ConfirmRequest, ConfirmResponse, EventConsumer, EventPublisher,
    Message, Supplier, TransitionOutcome, WalletGateway,
};

/// Supplier retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before retry `n` is `backoff_step * n`.
    pub backoff_step: Duration,
    /// Deadline for a single supplier call.
    pub call_timeout: Duration,
}

impl RetryPolicy {
    /// Total supplier calls before giving up.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff_step * retry
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_step: Duration::from_millis(300),
            call_timeout: Duration::from_secs(5),
        }
    }
}

/// Loop timing and topic names.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub retry: RetryPolicy,
    /// Sleep when the topic is drained.
    pub poll_interval: Duration,
    /// Sleep after a failure that leaves the message uncommitted.
    pub error_backoff: Duration,
    pub topics: Topics,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            poll_interval: Duration::from_millis(200),
            error_backoff: Duration::from_millis(500),
            topics: Topics::default(),
        }
    }
}

/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The bet reached this status in this pass.
    Settled(BetStatus),
    /// The bet was already terminal; compensation and announcement replayed.
    Replayed(BetStatus),
    /// Supplier retries ran out; payload forwarded to the dead-letter topic.
    DeadLettered,
    /// Undecodable payload or unknown bet.
    Skipped,
}

/// Consume loop plus the per-message saga step.
pub struct ConfirmationWorker {
    consumer: Arc<dyn EventConsumer>,
    publisher: Arc<dyn EventPublisher>,
    bets: Arc<dyn BetStore>,
    wallet: Arc<dyn WalletGateway>,
    supplier: Arc<dyn Supplier>,
    settings: WorkerSettings,
}

impl ConfirmationWorker {
    pub fn new(
        consumer: Arc<dyn EventConsumer>,
        publisher: Arc<dyn EventPublisher>,
        bets: Arc<dyn BetStore>,
        wallet: Arc<dyn WalletGateway>,
        supplier: Arc<dyn Supplier>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            consumer,
            publisher,
            bets,
            wallet,
            supplier,
            settings,
        }
    }

    /// Run until `shutdown` turns true or its sender goes away.
    ///
    /// The signal is checked between messages; a message being processed
    /// always runs to completion.
    ///
    /// # Errors
    /// Never returns an error today; failures are logged and retried.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(topic = %self.settings.topics.bet_placed, "Confirmation worker started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            let pause = match self.consumer.fetch().await {
                Ok(Some(message)) => self.process(&message).await,
                Ok(None) => Some(self.settings.poll_interval),
                Err(err) => {
                    warn!(error = %err, "Failed to fetch from bus");
                    Some(self.settings.error_backoff)
                }
            };

            if let Some(delay) = pause {
                tokio::select! {
                    () = sleep(delay) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }
        info!("Confirmation worker stopped");
        Ok(())
    }

    /// Handle and commit one message. Returns a pause when the message has
    /// to be retried later.
    async fn process(&self, message: &Message) -> Option<Duration> {
        match self.handle(message).await {
            Ok(outcome) => {
                debug!(
                    partition = message.partition,
                    offset = message.offset,
                    outcome = ?outcome,
                    "Message handled"
                );
                match self.consumer.commit(message).await {
                    Ok(()) => None,
                    Err(err) => {
                        warn!(
                            partition = message.partition,
                            offset = message.offset,
                            error = %err,
                            "Failed to commit offset, message will be redelivered"
                        );
                        Some(self.settings.error_backoff)
                    }
                }
            }
            Err(err) => {
                error!(
                    key = %message.key,
                    partition = message.partition,
                    offset = message.offset,
                    error = %err,
                    "Processing failed, message left for redelivery"
                );
                Some(self.settings.error_backoff)
            }
        }
    }

    /// Run the saga step for one `bet_placed` message.
    ///
    /// `Ok` means the message may be committed. `Err` means a write the
    /// saga depends on failed and the message must be delivered again.
    ///
    /// # Errors
    /// Returns an error when the bet cannot be read or updated, or when
    /// neither the outcome topic nor its dead-letter topic accepts the
    /// announcement.
    pub async fn handle(&self, message: &Message) -> Result<Outcome> {
        let event: BetPlaced = match serde_json::from_str(&message.payload) {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    key = %message.key,
                    offset = message.offset,
                    error = %err,
                    "Skipping undecodable message"
                );
                return Ok(Outcome::Skipped);
            }
        };

        let Some(bet) = self.bets.get(&event.bet_id).await? else {
            warn!(bet_id = %event.bet_id, "Skipping message for unknown bet");
            return Ok(Outcome::Skipped);
        };
        if bet.status.is_terminal() {
            info!(bet_id = %event.bet_id, status = %bet.status, "Bet already settled, replaying");
            self.replay(&event, bet.status).await?;
            return Ok(Outcome::Replayed(bet.status));
        }

        let Some(verdict) = self.confirm_with_retry(&event).await else {
            self.dead_letter(&self.settings.topics.bet_placed_dlq, message)
                .await?;
            warn!(
                bet_id = %event.bet_id,
                attempts = self.settings.retry.attempts(),
                "Supplier retries exhausted, bet left pending"
            );
            return Ok(Outcome::DeadLettered);
        };

        let status = BetStatus::from_supplier(&verdict.status);
        match self.bets.transition(&event.bet_id, status).await? {
            TransitionOutcome::Applied => {}
            TransitionOutcome::AlreadyTerminal(stored) => {
                info!(bet_id = %event.bet_id, status = %stored, "Bet settled concurrently, replaying");
                self.replay(&event, stored).await?;
                return Ok(Outcome::Replayed(stored));
            }
            TransitionOutcome::NotFound => {
                warn!(bet_id = %event.bet_id, "Bet vanished before settlement");
                return Ok(Outcome::Skipped);
            }
        }
        info!(
            bet_id = %event.bet_id,
            user_id = %event.user_id,
            status = %status,
            raw_status = %verdict.status,
            "Bet settled"
        );

        self.audit(&event, status, verdict.reason.clone()).await;
        self.settle_funds(&event, status).await;
        self.announce(&event, status, verdict.reason, verdict.provider_ref)
            .await?;
        Ok(Outcome::Settled(status))
    }

    async fn confirm_with_retry(&self, event: &BetPlaced) -> Option<ConfirmResponse> {
        let policy = self.settings.retry;
        let request = ConfirmRequest::from(event);

        for attempt in 1..=policy.attempts() {
            if attempt > 1 {
                sleep(policy.delay_for(attempt - 1)).await;
            }
            let result = match timeout(policy.call_timeout, self.supplier.confirm(&request)).await
            {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout {
                    operation: "supplier confirm",
                    millis: u64::try_from(policy.call_timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            };
            match result {
                Ok(verdict) => return Some(verdict),
                Err(err) => warn!(
                    bet_id = %event.bet_id,
                    attempt,
                    max_attempts = policy.attempts(),
                    transient = err.is_transient(),
                    error = %err,
                    "Supplier call failed"
                ),
            }
        }
        None
    }

    async fn audit(&self, event: &BetPlaced, status: BetStatus, reason: Option<String>) {
        let transition = BetTransition::now(
            event.bet_id.clone(),
            BetStatus::PendingConfirmation,
            status,
            reason,
        );
        if let Err(err) = self.bets.record_transition(&transition).await {
            warn!(bet_id = %event.bet_id, error = %err, "Failed to write transition audit");
        }
    }

    /// Release or consume the stake. Failures are logged, never retried.
    async fn settle_funds(&self, event: &BetPlaced, status: BetStatus) {
        let external_ref = event.refund_ref();
        match status {
            BetStatus::Rejected => {
                if let Err(err) = self.wallet.refund(&event.user_id, &external_ref).await {
                    error!(
                        bet_id = %event.bet_id,
                        user_id = %event.user_id,
                        external_ref = %external_ref,
                        error = %err,
                        "Refund after rejection failed, stake remains reserved"
                    );
                }
            }
            BetStatus::Confirmed => {
                if let Err(err) = self.wallet.commit(&event.user_id, &external_ref).await {
                    warn!(
                        bet_id = %event.bet_id,
                        user_id = %event.user_id,
                        external_ref = %external_ref,
                        error = %err,
                        "Commit after confirmation failed"
                    );
                }
            }
            BetStatus::PendingConfirmation => {}
        }
    }

    async fn replay(&self, event: &BetPlaced, status: BetStatus) -> Result<()> {
        self.settle_funds(event, status).await;
        let reason = match self.bets.transitions(&event.bet_id).await {
            Ok(history) => history.into_iter().last().and_then(|t| t.reason),
            Err(err) => {
                debug!(bet_id = %event.bet_id, error = %err, "No transition history for replay");
                None
            }
        };
        self.announce(event, status, reason, None).await
    }

    async fn announce(
        &self,
        event: &BetPlaced,
        status: BetStatus,
        reason: Option<String>,
        provider_ref: Option<String>,
    ) -> Result<()> {
        let outcome = BetConfirmed {
            bet_id: event.bet_id.clone(),
            user_id: event.user_id.clone(),
            status,
            reason,
            provider_ref,
            ts: Utc::now(),
        };
        let topics = &self.settings.topics;
        let key = event.bet_id.as_str();

        let Err(err) = publish_json(self.publisher.as_ref(), &topics.bet_confirmed, key, &outcome).await
        else {
            return Ok(());
        };
        warn!(
            bet_id = %event.bet_id,
            error = %err,
            "Failed to publish outcome, routing to dead-letter topic"
        );
        publish_json(
            self.publisher.as_ref(),
            &topics.bet_confirmed_dlq,
            key,
            &outcome,
        )
        .await
    }

    async fn dead_letter(&self, topic: &str, message: &Message) -> Result<()> {
        self.publisher
            .publish(topic, &message.key, &message.payload)
            .await
    }
}
