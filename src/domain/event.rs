//! Event payloads carried on the bus.
//!
//! Payloads are camelCase JSON. Both events are keyed by bet id so every
//! message for one bet lands in the same partition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bet::{Bet, BetStatus};
use super::id::{BetId, ExternalRef, UserId};
use super::money::{Cents, Odd};

/// Announcement that a bet was taken in and its stake reserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetPlaced {
    pub bet_id: BetId,
    pub user_id: UserId,
    pub event_id: String,
    pub market: String,
    pub selection: String,
    pub stake_cents: Cents,
    #[serde(with = "rust_decimal::serde::float")]
    pub odd_value: Odd,
    /// External ref of the stake reservation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_ref: Option<ExternalRef>,
    pub ts_unix_ms: i64,
}

impl BetPlaced {
    #[must_use]
    pub fn from_bet(bet: &Bet, reserved_ref: ExternalRef) -> Self {
        Self {
            bet_id: bet.id.clone(),
            user_id: bet.user_id.clone(),
            event_id: bet.event_id.clone(),
            market: bet.market.clone(),
            selection: bet.selection.clone(),
            stake_cents: bet.stake_cents,
            odd_value: bet.odd_value,
            reserved_ref: Some(reserved_ref),
            ts_unix_ms: Utc::now().timestamp_millis(),
        }
    }

    /// Ref to refund against, falling back to the bet id for payloads
    /// that predate `reservedRef`.
    #[must_use]
    pub fn refund_ref(&self) -> ExternalRef {
        match &self.reserved_ref {
            Some(r) if !r.is_blank() => r.clone(),
            _ => self.bet_id.reservation_ref(),
        }
    }
}

/// Outcome of the confirmation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetConfirmed {
    pub bet_id: BetId,
    pub user_id: UserId,
    pub status: BetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_ref: Option<String>,
    pub ts: DateTime<Utc>,
}

/// Topic names used by the saga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topics {
    pub bet_placed: String,
    pub bet_confirmed: String,
    pub bet_placed_dlq: String,
    pub bet_confirmed_dlq: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            bet_placed: "bet_placed".into(),
            bet_confirmed: "bet_confirmed".into(),
            bet_placed_dlq: "bet_placed_dlq".into(),
            bet_confirmed_dlq: "bet_confirmed_dlq".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn placed() -> BetPlaced {
        BetPlaced {
            bet_id: BetId::from("bet-1"),
            user_id: UserId::new("alice"),
            event_id: "evt-1".into(),
            market: "match_winner".into(),
            selection: "home".into(),
            stake_cents: 500,
            odd_value: dec!(1.85),
            reserved_ref: Some(ExternalRef::from("bet-1")),
            ts_unix_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn bet_placed_uses_camel_case_and_numeric_odd() {
        let json: serde_json::Value = serde_json::to_value(placed()).unwrap();
        assert_eq!(json["betId"], "bet-1");
        assert_eq!(json["stakeCents"], 500);
        assert_eq!(json["oddValue"], 1.85);
        assert_eq!(json["reservedRef"], "bet-1");
        assert_eq!(json["tsUnixMs"], 1_700_000_000_000_i64);
    }

    #[test]
    fn refund_ref_falls_back_to_bet_id() {
        let mut event = placed();
        event.reserved_ref = None;
        assert_eq!(event.refund_ref(), ExternalRef::from("bet-1"));

        event.reserved_ref = Some(ExternalRef::from(""));
        assert_eq!(event.refund_ref(), ExternalRef::from("bet-1"));

        event.reserved_ref = Some(ExternalRef::from("hold-9"));
        assert_eq!(event.refund_ref(), ExternalRef::from("hold-9"));
    }

    #[test]
    fn legacy_payload_without_reserved_ref_decodes() {
        let event: BetPlaced = serde_json::from_str(
            r#"{"betId":"b","userId":"u","eventId":"e","market":"m","selection":"s",
                "stakeCents":100,"oddValue":2,"tsUnixMs":1}"#,
        )
        .unwrap();
        assert_eq!(event.reserved_ref, None);
        assert_eq!(event.odd_value, dec!(2));
    }

    #[test]
    fn bet_confirmed_omits_absent_optionals() {
        let event = BetConfirmed {
            bet_id: BetId::from("bet-1"),
            user_id: UserId::new("alice"),
            status: BetStatus::Confirmed,
            reason: None,
            provider_ref: Some("SUP-bet-1".into()),
            ts: Utc::now(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "CONFIRMED");
        assert_eq!(json["providerRef"], "SUP-bet-1");
        assert!(json.get("reason").is_none());
        assert!(json["ts"].as_str().unwrap().contains('T'));
    }
}
