//! SQLite wallet ledger.
//!
//! Every operation is one `BEGIN IMMEDIATE` transaction. SQLite hands out
//! the write lock before the wallet row is read, so the read-check-write
//! sequence of each operation is serialized against every other writer,
//! in this process or any other sharing the file.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::{debug, info};

use super::database::connection::{run_blocking, DbPool};
use super::database::model::{LedgerRow, NewLedgerRow, ReservationRow, WalletRow};
use super::database::schema::{wallet_ledger, wallet_reservations, wallets};
use crate::domain::money::ensure_positive_cents;
use crate::domain::{
    Cents, DomainError, ExternalRef, LedgerEntry, OperationType, Reservation, ReservationId,
    Settlement, UserId, Wallet, WalletId,
};
use crate::error::{Error, LedgerError, Result};
use crate::port::outbound::{LedgerAudit, WalletGateway};

/// SQLite-backed wallet ledger.
///
/// Sole writer of the `wallets`, `wallet_reservations` and `wallet_ledger`
/// tables.
#[derive(Clone)]
pub struct SqliteLedger {
    pool: DbPool,
}

impl SqliteLedger {
    /// Create a new ledger over the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn find_wallet(conn: &mut SqliteConnection, user_id: &UserId) -> Result<Option<WalletRow>> {
        Ok(wallets::table
            .filter(wallets::user_id.eq(user_id.as_str()))
            .select(WalletRow::as_select())
            .first(conn)
            .optional()?)
    }

    fn find_or_open_wallet(conn: &mut SqliteConnection, user_id: &UserId) -> Result<WalletRow> {
        if let Some(row) = Self::find_wallet(conn, user_id)? {
            return Ok(row);
        }
        let wallet = Wallet::open(user_id.clone());
        let now = Utc::now().to_rfc3339();
        let row = WalletRow {
            id: wallet.id.to_string(),
            user_id: wallet.user_id.to_string(),
            balance_cents: wallet.balance_cents,
            version: wallet.version,
            created_at: now.clone(),
            updated_at: now,
        };
        diesel::insert_into(wallets::table)
            .values(&row)
            .execute(conn)?;
        debug!(user_id = %user_id, wallet_id = %row.id, "Opened wallet");
        Ok(row)
    }

    fn find_reservation(
        conn: &mut SqliteConnection,
        wallet_id: &str,
        external_ref: &ExternalRef,
    ) -> Result<Option<ReservationRow>> {
        Ok(wallet_reservations::table
            .filter(wallet_reservations::wallet_id.eq(wallet_id))
            .filter(wallet_reservations::external_ref.eq(external_ref.as_str()))
            .select(ReservationRow::as_select())
            .first(conn)
            .optional()?)
    }

    fn store_balance(conn: &mut SqliteConnection, wallet: &Wallet) -> Result<()> {
        diesel::update(wallets::table.find(wallet.id.as_str()))
            .set((
                wallets::balance_cents.eq(wallet.balance_cents),
                wallets::version.eq(wallet.version),
                wallets::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(conn)?;
        Ok(())
    }

    fn append_entry(
        conn: &mut SqliteConnection,
        wallet_id: &WalletId,
        operation: OperationType,
        amount: Cents,
        external_ref: &ExternalRef,
    ) -> Result<()> {
        let row = NewLedgerRow {
            wallet_id: wallet_id.to_string(),
            operation_type: operation.as_str().to_string(),
            amount_cents: amount,
            description: operation.describe(external_ref.as_str()),
            created_at: Utc::now().to_rfc3339(),
        };
        diesel::insert_into(wallet_ledger::table)
            .values(&row)
            .execute(conn)?;
        Ok(())
    }

    fn settle(
        conn: &mut SqliteConnection,
        user_id: &UserId,
        external_ref: &ExternalRef,
        settlement: Settlement,
    ) -> Result<bool> {
        let not_found = || LedgerError::NotFound {
            external_ref: external_ref.to_string(),
        };
        let wallet_row = Self::find_wallet(conn, user_id)?.ok_or_else(not_found)?;
        let row =
            Self::find_reservation(conn, &wallet_row.id, external_ref)?.ok_or_else(not_found)?;
        let mut reservation = reservation_from_row(row)?;

        if !reservation.settle(settlement) {
            return Ok(false);
        }

        diesel::update(wallet_reservations::table.find(reservation.id.as_str()))
            .set((
                wallet_reservations::status.eq(reservation.status.as_str()),
                wallet_reservations::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(conn)?;

        let delta = settlement.balance_delta(reservation.amount_cents);
        if delta > 0 {
            let mut wallet = wallet_from_row(wallet_row);
            wallet.credit(delta)?;
            Self::store_balance(conn, &wallet)?;
        }

        Self::append_entry(
            conn,
            &reservation.wallet_id,
            settlement.operation(),
            reservation.amount_cents,
            external_ref,
        )?;
        Ok(true)
    }
}

fn wallet_from_row(row: WalletRow) -> Wallet {
    Wallet {
        id: WalletId::from(row.id),
        user_id: UserId::new(row.user_id),
        balance_cents: row.balance_cents,
        version: row.version,
    }
}

fn reservation_from_row(row: ReservationRow) -> Result<Reservation> {
    Ok(Reservation {
        id: ReservationId::from(row.id),
        wallet_id: WalletId::from(row.wallet_id),
        external_ref: ExternalRef::new(row.external_ref),
        amount_cents: row.amount_cents,
        status: row.status.parse()?,
    })
}

fn entry_from_row(row: LedgerRow) -> Result<LedgerEntry> {
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&row.created_at)
        .map_err(|e| Error::Parse(e.to_string()))?
        .with_timezone(&Utc);
    Ok(LedgerEntry {
        wallet_id: WalletId::from(row.wallet_id),
        operation: row.operation_type.parse()?,
        amount_cents: row.amount_cents,
        description: row.description,
        created_at,
    })
}

#[async_trait]
impl WalletGateway for SqliteLedger {
    async fn get_or_create_wallet(&self, user_id: &UserId) -> Result<Wallet> {
        if user_id.is_blank() {
            return Err(DomainError::MissingField { field: "userId" }.into());
        }
        let user_id = user_id.clone();
        run_blocking(&self.pool, move |conn| {
            conn.immediate_transaction::<_, Error, _>(|conn| {
                Self::find_or_open_wallet(conn, &user_id).map(wallet_from_row)
            })
        })
        .await
    }

    async fn deposit(
        &self,
        user_id: &UserId,
        amount: Cents,
        external_ref: &ExternalRef,
    ) -> Result<Wallet> {
        if user_id.is_blank() {
            return Err(DomainError::MissingField { field: "userId" }.into());
        }
        ensure_positive_cents("amountCents", amount)?;

        let user_id = user_id.clone();
        let external_ref = external_ref.clone();
        let wallet = run_blocking(&self.pool, move |conn| {
            conn.immediate_transaction::<_, Error, _>(|conn| {
                let mut wallet = wallet_from_row(Self::find_or_open_wallet(conn, &user_id)?);
                wallet.credit(amount)?;
                Self::store_balance(conn, &wallet)?;
                Self::append_entry(
                    conn,
                    &wallet.id,
                    OperationType::Credit,
                    amount,
                    &external_ref,
                )?;
                Ok(wallet)
            })
        })
        .await?;

        info!(
            user_id = %wallet.user_id,
            amount_cents = amount,
            balance_cents = wallet.balance_cents,
            "Deposit credited"
        );
        Ok(wallet)
    }

    async fn reserve(
        &self,
        user_id: &UserId,
        amount: Cents,
        external_ref: &ExternalRef,
    ) -> Result<ReservationId> {
        if user_id.is_blank() {
            return Err(DomainError::MissingField { field: "userId" }.into());
        }
        ensure_positive_cents("amountCents", amount)?;
        if external_ref.is_blank() {
            return Err(DomainError::MissingField {
                field: "externalRef",
            }
            .into());
        }

        let user = user_id.clone();
        let reference = external_ref.clone();
        let (reservation_id, created) = run_blocking(&self.pool, move |conn| {
            conn.immediate_transaction::<_, Error, _>(|conn| {
                let Some(wallet_row) = Self::find_wallet(conn, &user)? else {
                    return Err(LedgerError::InsufficientFunds { requested: amount }.into());
                };

                if let Some(existing) = Self::find_reservation(conn, &wallet_row.id, &reference)? {
                    return Ok((ReservationId::from(existing.id), false));
                }

                let mut wallet = wallet_from_row(wallet_row);
                wallet.debit(amount)?;
                Self::store_balance(conn, &wallet)?;

                let reservation = Reservation::hold(wallet.id.clone(), reference.clone(), amount);
                let now = Utc::now().to_rfc3339();
                diesel::insert_into(wallet_reservations::table)
                    .values(&ReservationRow {
                        id: reservation.id.to_string(),
                        wallet_id: reservation.wallet_id.to_string(),
                        external_ref: reservation.external_ref.to_string(),
                        amount_cents: reservation.amount_cents,
                        status: reservation.status.as_str().to_string(),
                        created_at: now.clone(),
                        updated_at: now,
                    })
                    .execute(conn)?;

                Self::append_entry(conn, &wallet.id, OperationType::Reserve, amount, &reference)?;
                Ok((reservation.id, true))
            })
        })
        .await?;

        if created {
            info!(
                user_id = %user_id,
                external_ref = %external_ref,
                amount_cents = amount,
                reservation_id = %reservation_id,
                "Funds reserved"
            );
        } else {
            debug!(
                user_id = %user_id,
                external_ref = %external_ref,
                reservation_id = %reservation_id,
                "Reservation already exists"
            );
        }
        Ok(reservation_id)
    }

    async fn commit(&self, user_id: &UserId, external_ref: &ExternalRef) -> Result<()> {
        let user = user_id.clone();
        let reference = external_ref.clone();
        let applied = run_blocking(&self.pool, move |conn| {
            conn.immediate_transaction::<_, Error, _>(|conn| {
                Self::settle(conn, &user, &reference, Settlement::Commit)
            })
        })
        .await?;
        info!(
            user_id = %user_id,
            external_ref = %external_ref,
            applied,
            "Reservation committed"
        );
        Ok(())
    }

    async fn refund(&self, user_id: &UserId, external_ref: &ExternalRef) -> Result<()> {
        let user = user_id.clone();
        let reference = external_ref.clone();
        let applied = run_blocking(&self.pool, move |conn| {
            conn.immediate_transaction::<_, Error, _>(|conn| {
                Self::settle(conn, &user, &reference, Settlement::Refund)
            })
        })
        .await?;
        info!(
            user_id = %user_id,
            external_ref = %external_ref,
            applied,
            "Reservation refunded"
        );
        Ok(())
    }
}

#[async_trait]
impl LedgerAudit for SqliteLedger {
    async fn entries(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>> {
        let user_id = user_id.clone();
        run_blocking(&self.pool, move |conn| {
            let Some(wallet) = Self::find_wallet(conn, &user_id)? else {
                return Ok(Vec::new());
            };
            let rows: Vec<LedgerRow> = wallet_ledger::table
                .filter(wallet_ledger::wallet_id.eq(&wallet.id))
                .order(wallet_ledger::id.asc())
                .select(LedgerRow::as_select())
                .load(conn)?;
            rows.into_iter().map(entry_from_row).collect()
        })
        .await
    }

    async fn reservation(
        &self,
        user_id: &UserId,
        external_ref: &ExternalRef,
    ) -> Result<Option<Reservation>> {
        let user_id = user_id.clone();
        let external_ref = external_ref.clone();
        run_blocking(&self.pool, move |conn| {
            let Some(wallet) = Self::find_wallet(conn, &user_id)? else {
                return Ok(None);
            };
            Self::find_reservation(conn, &wallet.id, &external_ref)?
                .map(reservation_from_row)
                .transpose()
        })
        .await
    }
}
