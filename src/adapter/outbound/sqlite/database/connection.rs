//! Database connection management using Diesel ORM.
//!
//! Provides connection pooling, migration support, and connection
//! configuration for SQLite databases. Every pooled connection runs with
//! WAL journaling and a busy timeout so several processes can share one
//! database file.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{Error, Result};

/// Embedded database migrations compiled from the migrations/ directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Type alias for a SQLite connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const DEFAULT_POOL_SIZE: u32 = 5;

/// Applies pragmas to each new pooled connection.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        apply_pragmas(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

fn apply_pragmas(conn: &mut SqliteConnection) -> QueryResult<()> {
    diesel::sql_query("PRAGMA busy_timeout=5000").execute(conn)?;
    diesel::sql_query("PRAGMA journal_mode=WAL").execute(conn)?;
    diesel::sql_query("PRAGMA foreign_keys=ON").execute(conn)?;
    Ok(())
}

/// Create a connection pool for the given database URL.
///
/// # Errors
/// Returns an error if the pool cannot be created.
pub fn create_pool(database_url: &str) -> Result<DbPool> {
    create_pool_sized(database_url, DEFAULT_POOL_SIZE)
}

/// Create a connection pool with an explicit size.
///
/// # Errors
/// Returns an error if the pool cannot be created.
pub fn create_pool_sized(database_url: &str, max_size: u32) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size.max(1))
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
        .map_err(|e| Error::Connection(e.to_string()))
}

/// Run all pending database migrations.
///
/// # Errors
/// Returns an error if migrations fail.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Connection(e.to_string()))?;
    Ok(())
}

/// Run blocking Diesel work on the blocking thread pool.
///
/// Diesel is synchronous; async adapters hand their queries to this helper
/// so the runtime's worker threads never wait on SQLite locks.
///
/// # Errors
/// Returns the closure's error, or [`Error::Connection`] if no connection
/// could be checked out or the blocking task panicked.
pub async fn run_blocking<T, F>(pool: &DbPool, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
        f(&mut *conn)
    })
    .await
    .map_err(|e| Error::Connection(format!("blocking database task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::db::TempDb;

    #[derive(diesel::QueryableByName)]
    struct TableName {
        #[diesel(sql_type = diesel::sql_types::Text)]
        name: String,
    }

    #[derive(diesel::QueryableByName)]
    struct JournalMode {
        #[diesel(sql_type = diesel::sql_types::Text)]
        journal_mode: String,
    }

    #[test]
    fn create_pool_with_memory_db() {
        let pool = create_pool(":memory:");
        assert!(pool.is_ok());
    }

    #[test]
    fn run_migrations_creates_tables() {
        let db = TempDb::create("connection-tables");
        let mut conn = db.pool().get().unwrap();

        let tables: Vec<String> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name",
        )
        .load::<TableName>(&mut conn)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();

        for table in [
            "bet_transactions",
            "bets",
            "bus_messages",
            "bus_offsets",
            "odds_snapshots",
            "wallet_ledger",
            "wallet_reservations",
            "wallets",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn run_migrations_is_idempotent() {
        let db = TempDb::create("connection-idempotent");
        run_migrations(db.pool()).unwrap();
        run_migrations(db.pool()).unwrap();
    }

    #[test]
    fn pooled_connections_use_wal() {
        let db = TempDb::create("connection-wal");
        let mut conn = db.pool().get().unwrap();
        let mode = diesel::sql_query("PRAGMA journal_mode")
            .get_result::<JournalMode>(&mut conn)
            .unwrap();
        assert_eq!(mode.journal_mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn run_blocking_returns_closure_result() {
        let db = TempDb::create("connection-blocking");
        let count = run_blocking(db.pool(), |conn| {
            let rows: Vec<TableName> =
                diesel::sql_query("SELECT name FROM sqlite_master WHERE name = 'wallets'")
                    .load(conn)?;
            Ok(rows.len())
        })
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn run_blocking_propagates_errors() {
        let db = TempDb::create("connection-blocking-err");
        let result: Result<()> =
            run_blocking(db.pool(), |_conn| Err(Error::Database("boom".into()))).await;
        assert!(matches!(result, Err(Error::Database(m)) if m == "boom"));
    }
}
