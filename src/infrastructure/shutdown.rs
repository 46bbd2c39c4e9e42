//! Process shutdown signal.
//!
//! One `watch` channel fans the signal out to every server and worker.
//! Receivers observe `true` once shutdown was requested; a dropped sender
//! counts as shutdown too.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

/// Sending half of the shutdown signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// New signal, not yet triggered, plus one receiver.
    #[must_use]
    pub fn channel() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Another receiver for the same signal.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Request shutdown.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Trigger once the process receives Ctrl-C (or SIGTERM on unix).
    pub fn trigger_on_signal(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("Shutdown signal received");
            this.trigger();
        });
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
                return;
            }
            Err(err) => warn!(error = %err, "SIGTERM handler unavailable, using Ctrl-C only"),
        }
    }
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_reaches_every_receiver() {
        let (shutdown, mut first) = Shutdown::channel();
        let mut second = shutdown.subscribe();

        shutdown.trigger();

        first.changed().await.unwrap();
        second.changed().await.unwrap();
        assert!(*first.borrow());
        assert!(*second.borrow());
        assert!(shutdown.is_triggered());
    }
}
