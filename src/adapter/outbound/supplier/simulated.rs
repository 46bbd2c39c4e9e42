//! Randomized supplier.
//!
//! Accepts a configurable share of bets and rejects the rest. There is no
//! real protocol behind it.

use async_trait::async_trait;
use rand::Rng;

use crate::domain::BetId;
use crate::error::{ConfigError, Result};
use crate::port::outbound::{ConfirmRequest, ConfirmResponse, Supplier};

/// Reason attached to simulated rejections.
pub const REJECT_REASON: &str = "supplier_reject_mock";

/// Provider reference for `bet_id`: `SUP-` plus its first eight characters.
#[must_use]
pub fn provider_ref(bet_id: &BetId) -> String {
    let prefix: String = bet_id.as_str().chars().take(8).collect();
    format!("SUP-{prefix}")
}

/// Supplier that flips a biased coin per bet.
#[derive(Debug, Clone, Copy)]
pub struct RandomSupplier {
    accept_probability: f64,
}

impl RandomSupplier {
    /// Create a supplier accepting with probability `accept_probability`.
    ///
    /// # Errors
    /// Returns an error unless the probability lies in `[0, 1]`.
    pub fn new(accept_probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&accept_probability) {
            return Err(ConfigError::InvalidValue {
                field: "supplier.accept_probability",
                reason: format!("must be within [0, 1], got {accept_probability}"),
            }
            .into());
        }
        Ok(Self { accept_probability })
    }

    /// Verdict for one bet.
    #[must_use]
    pub fn decide(&self, request: &ConfirmRequest) -> ConfirmResponse {
        let accepted = rand::thread_rng().gen_bool(self.accept_probability);
        if accepted {
            ConfirmResponse {
                status: "CONFIRMED".into(),
                provider_ref: Some(provider_ref(&request.bet_id)),
                reason: None,
            }
        } else {
            ConfirmResponse {
                status: "REJECTED".into(),
                provider_ref: Some(provider_ref(&request.bet_id)),
                reason: Some(REJECT_REASON.into()),
            }
        }
    }
}

impl Default for RandomSupplier {
    fn default() -> Self {
        Self {
            accept_probability: 0.8,
        }
    }
}

#[async_trait]
impl Supplier for RandomSupplier {
    async fn confirm(&self, request: &ConfirmRequest) -> Result<ConfirmResponse> {
        Ok(self.decide(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use rust_decimal_macros::dec;

    fn request() -> ConfirmRequest {
        ConfirmRequest {
            bet_id: BetId::from("0123456789abcdef"),
            user_id: UserId::new("alice"),
            event_id: "evt-1".into(),
            stake_cents: 500,
            odd_value: dec!(2.0),
        }
    }

    #[test]
    fn provider_ref_uses_first_eight_chars() {
        assert_eq!(provider_ref(&BetId::from("0123456789abcdef")), "SUP-01234567");
        assert_eq!(provider_ref(&BetId::from("abc")), "SUP-abc");
    }

    #[test]
    fn certain_acceptance_always_confirms() {
        let supplier = RandomSupplier::new(1.0).unwrap();
        for _ in 0..20 {
            let verdict = supplier.decide(&request());
            assert_eq!(verdict.status, "CONFIRMED");
            assert_eq!(verdict.reason, None);
        }
    }

    #[test]
    fn zero_acceptance_always_rejects_with_reason() {
        let supplier = RandomSupplier::new(0.0).unwrap();
        let verdict = supplier.decide(&request());
        assert_eq!(verdict.status, "REJECTED");
        assert_eq!(verdict.reason.as_deref(), Some(REJECT_REASON));
        assert_eq!(verdict.provider_ref.as_deref(), Some("SUP-01234567"));
    }

    #[test]
    fn probability_outside_unit_interval_is_rejected() {
        assert!(RandomSupplier::new(1.5).is_err());
        assert!(RandomSupplier::new(-0.1).is_err());
    }
}
