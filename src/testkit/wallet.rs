//! Wallet gateway wrapper that records settlement calls and can be told
//! to fail them.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Cents, ExternalRef, ReservationId, UserId, Wallet};
use crate::error::{Error, Result};
use crate::port::outbound::WalletGateway;

pub struct RecordingWallet {
    inner: Arc<dyn WalletGateway>,
    refunds: AtomicU32,
    commits: AtomicU32,
    fail_refunds: AtomicBool,
    fail_commits: AtomicBool,
}

impl RecordingWallet {
    pub fn new(inner: Arc<dyn WalletGateway>) -> Self {
        Self {
            inner,
            refunds: AtomicU32::new(0),
            commits: AtomicU32::new(0),
            fail_refunds: AtomicBool::new(false),
            fail_commits: AtomicBool::new(false),
        }
    }

    pub fn fail_refunds(&self, fail: bool) {
        self.fail_refunds.store(fail, Ordering::SeqCst);
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Refund calls seen, including failed ones.
    pub fn refunds(&self) -> u32 {
        self.refunds.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> u32 {
        self.commits.load(Ordering::SeqCst)
    }
}

fn unavailable() -> Error {
    Error::Upstream {
        service: "wallet",
        status: 503,
        message: "scripted failure".into(),
    }
}

#[async_trait]
impl WalletGateway for RecordingWallet {
    async fn get_or_create_wallet(&self, user_id: &UserId) -> Result<Wallet> {
        self.inner.get_or_create_wallet(user_id).await
    }

    async fn deposit(
        &self,
        user_id: &UserId,
        amount: Cents,
        external_ref: &ExternalRef,
    ) -> Result<Wallet> {
        self.inner.deposit(user_id, amount, external_ref).await
    }

    async fn reserve(
        &self,
        user_id: &UserId,
        amount: Cents,
        external_ref: &ExternalRef,
    ) -> Result<ReservationId> {
        self.inner.reserve(user_id, amount, external_ref).await
    }

    async fn commit(&self, user_id: &UserId, external_ref: &ExternalRef) -> Result<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.commit(user_id, external_ref).await
    }

    async fn refund(&self, user_id: &UserId, external_ref: &ExternalRef) -> Result<()> {
        self.refunds.fetch_add(1, Ordering::SeqCst);
        if self.fail_refunds.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.refund(user_id, external_ref).await
    }
}
