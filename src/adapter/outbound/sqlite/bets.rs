//! SQLite bet store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use tracing::warn;

use super::database::connection::{run_blocking, DbPool};
use super::database::model::{BetRow, BetTransitionRow, NewBetTransitionRow};
use super::database::schema::{bet_transactions, bets};
use crate::domain::{Bet, BetId, BetStatus, BetTransition, UserId};
use crate::error::{Error, Result};
use crate::port::outbound::{BetStore, TransitionOutcome};

/// SQLite-backed bet store.
#[derive(Clone)]
pub struct SqliteBetStore {
    pool: DbPool,
}

impl SqliteBetStore {
    /// Create a new store over the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Bets still waiting for a verdict, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn pending(&self, limit: i64) -> Result<Vec<Bet>> {
        run_blocking(&self.pool, move |conn| {
            let rows: Vec<BetRow> = bets::table
                .filter(bets::status.eq(BetStatus::PendingConfirmation.as_str()))
                .order(bets::created_at.asc())
                .limit(limit)
                .select(BetRow::as_select())
                .load(conn)?;
            rows.into_iter().map(from_row).collect()
        })
        .await
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| Error::Parse(e.to_string()))?
        .with_timezone(&Utc))
}

fn to_row(bet: &Bet) -> BetRow {
    BetRow {
        id: bet.id.to_string(),
        user_id: bet.user_id.to_string(),
        event_id: bet.event_id.clone(),
        market: bet.market.clone(),
        selection: bet.selection.clone(),
        stake_cents: bet.stake_cents,
        odd_value: bet.odd_value.to_string(),
        status: bet.status.as_str().to_string(),
        created_at: bet.created_at.to_rfc3339(),
        updated_at: bet.updated_at.to_rfc3339(),
    }
}

fn from_row(row: BetRow) -> Result<Bet> {
    Ok(Bet {
        id: BetId::from(row.id),
        user_id: UserId::new(row.user_id),
        event_id: row.event_id,
        market: row.market,
        selection: row.selection,
        stake_cents: row.stake_cents,
        odd_value: Decimal::from_str(&row.odd_value).map_err(|e| Error::Parse(e.to_string()))?,
        status: row.status.parse()?,
        created_at: parse_time(&row.created_at)?,
        updated_at: parse_time(&row.updated_at)?,
    })
}

fn transition_from_row(row: BetTransitionRow) -> Result<BetTransition> {
    Ok(BetTransition {
        bet_id: BetId::from(row.bet_id),
        old_status: row.old_status.parse()?,
        new_status: row.new_status.parse()?,
        reason: row.reason,
        created_at: parse_time(&row.created_at)?,
    })
}

#[async_trait]
impl BetStore for SqliteBetStore {
    async fn insert(&self, bet: &Bet) -> Result<()> {
        let row = to_row(bet);
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(bets::table).values(&row).execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &BetId) -> Result<Option<Bet>> {
        let id = id.to_string();
        run_blocking(&self.pool, move |conn| {
            let row: Option<BetRow> = bets::table
                .find(id)
                .select(BetRow::as_select())
                .first(conn)
                .optional()?;
            row.map(from_row).transpose()
        })
        .await
    }

    async fn transition(&self, id: &BetId, next: BetStatus) -> Result<TransitionOutcome> {
        if !BetStatus::PendingConfirmation.can_transition_to(next) {
            warn!(bet_id = %id, status = %next, "Refusing transition to non-terminal status");
            return Err(Error::Parse(format!("cannot transition bet to {next}")));
        }
        let id = id.to_string();
        run_blocking(&self.pool, move |conn| {
            let updated = diesel::update(
                bets::table
                    .find(&id)
                    .filter(bets::status.eq(BetStatus::PendingConfirmation.as_str())),
            )
            .set((
                bets::status.eq(next.as_str()),
                bets::updated_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(conn)?;

            if updated > 0 {
                return Ok(TransitionOutcome::Applied);
            }

            let current: Option<String> = bets::table
                .find(&id)
                .select(bets::status)
                .first(conn)
                .optional()?;
            match current {
                Some(status) => Ok(TransitionOutcome::AlreadyTerminal(status.parse()?)),
                None => Ok(TransitionOutcome::NotFound),
            }
        })
        .await
    }

    async fn record_transition(&self, transition: &BetTransition) -> Result<()> {
        let row = NewBetTransitionRow {
            bet_id: transition.bet_id.to_string(),
            old_status: transition.old_status.as_str().to_string(),
            new_status: transition.new_status.as_str().to_string(),
            reason: transition.reason.clone(),
            created_at: transition.created_at.to_rfc3339(),
        };
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(bet_transactions::table)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn transitions(&self, id: &BetId) -> Result<Vec<BetTransition>> {
        let id = id.to_string();
        run_blocking(&self.pool, move |conn| {
            let rows: Vec<BetTransitionRow> = bet_transactions::table
                .filter(bet_transactions::bet_id.eq(&id))
                .order(bet_transactions::id.asc())
                .select(BetTransitionRow::as_select())
                .load(conn)?;
            rows.into_iter().map(transition_from_row).collect()
        })
        .await
    }
}
