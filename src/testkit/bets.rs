//! Bet store wrapper whose writes can be told to fail.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Bet, BetId, BetStatus, BetTransition};
use crate::error::{Error, Result};
use crate::port::outbound::{BetStore, TransitionOutcome};

pub struct FlakyBetStore {
    inner: Arc<dyn BetStore>,
    fail_transitions: AtomicBool,
    fail_audit: AtomicBool,
    transition_calls: AtomicU32,
}

impl FlakyBetStore {
    pub fn new(inner: Arc<dyn BetStore>) -> Self {
        Self {
            inner,
            fail_transitions: AtomicBool::new(false),
            fail_audit: AtomicBool::new(false),
            transition_calls: AtomicU32::new(0),
        }
    }

    /// Make status updates fail until switched back.
    pub fn fail_transitions(&self, fail: bool) {
        self.fail_transitions.store(fail, Ordering::SeqCst);
    }

    /// Make audit appends fail until switched back.
    pub fn fail_audit(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    /// Status updates attempted, including failed ones.
    pub fn transition_calls(&self) -> u32 {
        self.transition_calls.load(Ordering::SeqCst)
    }
}

fn locked() -> Error {
    Error::Database("database is locked".into())
}

#[async_trait]
impl BetStore for FlakyBetStore {
    async fn insert(&self, bet: &Bet) -> Result<()> {
        self.inner.insert(bet).await
    }

    async fn get(&self, id: &BetId) -> Result<Option<Bet>> {
        self.inner.get(id).await
    }

    async fn transition(&self, id: &BetId, next: BetStatus) -> Result<TransitionOutcome> {
        self.transition_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_transitions.load(Ordering::SeqCst) {
            return Err(locked());
        }
        self.inner.transition(id, next).await
    }

    async fn record_transition(&self, transition: &BetTransition) -> Result<()> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(locked());
        }
        self.inner.record_transition(transition).await
    }

    async fn transitions(&self, id: &BetId) -> Result<Vec<BetTransition>> {
        self.inner.transitions(id).await
    }
}
