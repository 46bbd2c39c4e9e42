//! SQLite odds snapshots.
//!
//! The odds feed itself lives elsewhere; this table holds the latest quote
//! per selection so placement can spot a stale odd.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use rust_decimal::Decimal;

use super::database::connection::{run_blocking, DbPool};
use super::database::model::OddsSnapshotRow;
use super::database::schema::odds_snapshots;
use crate::domain::money::ensure_positive_odd;
use crate::domain::Odd;
use crate::error::{Error, Result};
use crate::port::outbound::{OddsCache, OddsKey};

/// Odds cache backed by the `odds_snapshots` table.
#[derive(Clone)]
pub struct SqliteOddsCache {
    pool: DbPool,
}

impl SqliteOddsCache {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Store the latest quote for `key`, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error if the odd is not positive or the write fails.
    pub async fn put(&self, key: &OddsKey, odd: Odd) -> Result<()> {
        ensure_positive_odd(odd)?;
        let row = OddsSnapshotRow {
            event_id: key.event_id.clone(),
            market: key.market.clone(),
            selection: key.selection.clone(),
            odd_value: odd.to_string(),
            updated_at: Utc::now().to_rfc3339(),
        };
        run_blocking(&self.pool, move |conn| {
            diesel::replace_into(odds_snapshots::table)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl OddsCache for SqliteOddsCache {
    async fn current_odd(&self, key: &OddsKey) -> Result<Option<Odd>> {
        let key = key.clone();
        let value: Option<String> = run_blocking(&self.pool, move |conn| {
            Ok(odds_snapshots::table
                .find((&key.event_id, &key.market, &key.selection))
                .select(odds_snapshots::odd_value)
                .first(conn)
                .optional()?)
        })
        .await?;
        value
            .map(|v| Decimal::from_str(&v).map_err(|e| Error::Parse(e.to_string())))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::db::TempDb;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn put_replaces_previous_quote() {
        let db = TempDb::create("odds-put");
        let cache = SqliteOddsCache::new(db.pool().clone());
        let key = OddsKey::new("evt-1", "match_winner", "home");

        assert_eq!(cache.current_odd(&key).await.unwrap(), None);
        cache.put(&key, dec!(1.90)).await.unwrap();
        cache.put(&key, dec!(2.10)).await.unwrap();

        assert_eq!(cache.current_odd(&key).await.unwrap(), Some(dec!(2.10)));
    }

    #[tokio::test]
    async fn put_rejects_non_positive_odd() {
        let db = TempDb::create("odds-invalid");
        let cache = SqliteOddsCache::new(db.pool().clone());
        let key = OddsKey::new("e", "m", "s");
        assert!(cache.put(&key, Decimal::ZERO).await.is_err());
    }
}
