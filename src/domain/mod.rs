//! Settlement domain: money, wallets, reservations, bets and the events
//! that connect them. No I/O lives here.

pub mod bet;
pub mod error;
pub mod event;
pub mod id;
pub mod money;
pub mod reservation;
pub mod wallet;

pub use bet::{Bet, BetRequest, BetStatus, BetTransition};
pub use error::DomainError;
pub use event::{BetConfirmed, BetPlaced, Topics};
pub use id::{BetId, ExternalRef, ReservationId, UserId, WalletId};
pub use money::{Cents, Odd};
pub use reservation::{Reservation, ReservationStatus, Settlement};
pub use wallet::{LedgerEntry, OperationType, Wallet};
