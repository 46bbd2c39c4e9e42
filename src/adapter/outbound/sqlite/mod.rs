//! SQLite persistence adapters.
//!
//! Provides the wallet ledger, bet store, durable event log and odds
//! snapshot cache on top of Diesel ORM.

pub mod bets;
pub mod bus;
pub mod database;
pub mod ledger;
pub mod odds;

pub use bets::SqliteBetStore;
pub use bus::{partition_for, SqliteConsumer, SqliteEventLog};
pub use database::connection::{create_pool, run_migrations, DbPool};
pub use ledger::SqliteLedger;
pub use odds::SqliteOddsCache;
