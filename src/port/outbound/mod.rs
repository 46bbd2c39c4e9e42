//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the saga's dependencies: the wallet ledger,
//! bet storage, the event bus, the supplier and the odds cache.

pub mod bet_store;
pub mod bus;
pub mod odds;
pub mod supplier;
pub mod wallet;

pub use bet_store::{BetStore, TransitionOutcome};
pub use bus::{publish_json, EventConsumer, EventPublisher, Message};
pub use odds::{NoOddsCache, OddsCache, OddsKey};
pub use supplier::{ConfirmRequest, ConfirmResponse, Supplier};
pub use wallet::{LedgerAudit, WalletGateway};
