//! Betsettle - bet settlement saga over a wallet ledger.
//!
//! A bet is taken in by Bet Placement, which reserves the stake on the
//! wallet ledger and announces the bet on a partitioned event log. The
//! confirmation worker asks an external supplier for a verdict, settles
//! the bet, releases or consumes the stake, and announces the outcome.
//!
//! # Architecture
//!
//! - [`domain`] - Entities, state machines and event payloads. No I/O.
//! - [`port`] - Traits the application depends on.
//! - [`application`] - `BetPlacement` and `ConfirmationWorker`.
//! - [`adapter`] - SQLite, HTTP (axum server, reqwest client) and CLI adapters.
//! - [`infrastructure`] - Configuration, logging, wiring and shutdown.
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - Test doubles and temp databases for integration tests.

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
