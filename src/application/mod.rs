//! Application services (use cases).
//!
//! These services drive the saga through the outbound ports and never
//! touch a concrete adapter.

pub mod confirmation;
pub mod placement;

pub use confirmation::{ConfirmationWorker, Outcome, RetryPolicy, WorkerSettings};
pub use placement::{BetPlacement, PlacedBet};
