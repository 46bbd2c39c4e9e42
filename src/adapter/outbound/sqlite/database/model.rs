//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{
    bet_transactions, bets, bus_messages, bus_offsets, odds_snapshots, wallet_ledger,
    wallet_reservations, wallets,
};

/// Database row for a wallet.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = wallets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WalletRow {
    pub id: String,
    pub user_id: String,
    pub balance_cents: i64,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Database row for a reservation.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = wallet_reservations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReservationRow {
    pub id: String,
    pub wallet_id: String,
    pub external_ref: String,
    pub amount_cents: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Database row for a ledger entry (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = wallet_ledger)]
pub struct NewLedgerRow {
    pub wallet_id: String,
    pub operation_type: String,
    pub amount_cents: i64,
    pub description: String,
    pub created_at: String,
}

/// Database row for a ledger entry (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = wallet_ledger)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerRow {
    pub id: i32,
    pub wallet_id: String,
    pub operation_type: String,
    pub amount_cents: i64,
    pub description: String,
    pub created_at: String,
}

/// Database row for a bet.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = bets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BetRow {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub market: String,
    pub selection: String,
    pub stake_cents: i64,
    pub odd_value: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Database row for a bet transition (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = bet_transactions)]
pub struct NewBetTransitionRow {
    pub bet_id: String,
    pub old_status: String,
    pub new_status: String,
    pub reason: Option<String>,
    pub created_at: String,
}

/// Database row for a bet transition (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = bet_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BetTransitionRow {
    pub id: i32,
    pub bet_id: String,
    pub old_status: String,
    pub new_status: String,
    pub reason: Option<String>,
    pub created_at: String,
}

/// Database row for a bus message (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = bus_messages)]
pub struct NewBusMessageRow {
    pub topic: String,
    pub partition_id: i32,
    pub msg_offset: i64,
    pub msg_key: String,
    pub payload: String,
    pub created_at: String,
}

/// Database row for a bus message (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = bus_messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BusMessageRow {
    pub id: i32,
    pub topic: String,
    pub partition_id: i32,
    pub msg_offset: i64,
    pub msg_key: String,
    pub payload: String,
    pub created_at: String,
}

/// Database row for a consumer group offset.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = bus_offsets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BusOffsetRow {
    pub group_id: String,
    pub topic: String,
    pub partition_id: i32,
    pub next_offset: i64,
    pub updated_at: String,
}

/// Database row for a quoted odd.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = odds_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OddsSnapshotRow {
    pub event_id: String,
    pub market: String,
    pub selection: String,
    pub odd_value: String,
    pub updated_at: String,
}
