//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`db`] - Migrated throwaway SQLite databases.
//! - [`supplier`] - `ScriptedSupplier` with per-call replies and a call counter.
//! - [`wallet`] - `RecordingWallet`, a gateway wrapper with failure switches.
//! - [`bus`] - `FlakyPublisher`, fails appends to chosen topics.
//! - [`bets`] - `FlakyBetStore`, fails status updates or audit appends on demand.

pub mod bets;
pub mod bus;
pub mod db;
pub mod supplier;
pub mod wallet;
