//! Scripted supplier.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::port::outbound::{ConfirmRequest, ConfirmResponse, Supplier};

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer with this raw status string.
    Status(String),
    /// Answer REJECTED with a reason.
    Reject(String),
    /// Fail like an unavailable supplier (HTTP 503).
    Fail,
    /// Never answer within `delay`.
    Hang(Duration),
}

impl Reply {
    pub fn confirmed() -> Self {
        Self::Status("CONFIRMED".into())
    }
}

/// Pops one [`Reply`] per call, then repeats `fallback`.
pub struct ScriptedSupplier {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: Arc<AtomicU32>,
}

impl ScriptedSupplier {
    pub fn new(script: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn always(reply: Reply) -> Self {
        Self::new(Vec::new(), reply)
    }

    pub fn confirming() -> Self {
        Self::always(Reply::confirmed())
    }

    pub fn rejecting(reason: &str) -> Self {
        Self::always(Reply::Reject(reason.into()))
    }

    pub fn failing() -> Self {
        Self::always(Reply::Fail)
    }

    /// Number of `confirm` calls so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        let mut script = self.script.lock().expect("script lock");
        script.pop_front().unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl Supplier for ScriptedSupplier {
    async fn confirm(&self, request: &ConfirmRequest) -> Result<ConfirmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let provider_ref = Some(format!("TEST-{}", request.bet_id));
        match self.next_reply() {
            Reply::Status(status) => Ok(ConfirmResponse {
                status,
                provider_ref,
                reason: None,
            }),
            Reply::Reject(reason) => Ok(ConfirmResponse {
                status: "REJECTED".into(),
                provider_ref,
                reason: Some(reason),
            }),
            Reply::Fail => Err(Error::Upstream {
                service: "supplier",
                status: 503,
                message: "scripted failure".into(),
            }),
            Reply::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Err(Error::Connection("scripted hang finished".into()))
            }
        }
    }
}
