//! Composition root: turns a [`Config`] into running services.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::adapter::inbound::http;
use crate::adapter::outbound::http::{HttpSupplier, HttpWalletClient};
use crate::adapter::outbound::memory::MemoryOddsCache;
use crate::adapter::outbound::sqlite::database::connection::create_pool_sized;
use crate::adapter::outbound::sqlite::{
    run_migrations, DbPool, SqliteBetStore, SqliteConsumer, SqliteEventLog, SqliteLedger,
    SqliteOddsCache,
};
use crate::adapter::outbound::supplier::RandomSupplier;
use crate::application::{BetPlacement, ConfirmationWorker};
use crate::error::Result;
use crate::infrastructure::config::{Config, OddsBackend, WalletMode};
use crate::port::outbound::{NoOddsCache, OddsCache, WalletGateway};

/// Open the shared database and bring its schema up to date.
///
/// # Errors
/// Returns an error if the file cannot be opened or a migration fails.
pub fn open_database(config: &Config) -> Result<DbPool> {
    let pool = create_pool_sized(&config.database.path, config.database.pool_size)?;
    run_migrations(&pool)?;
    info!(path = %config.database.path, "Database ready");
    Ok(pool)
}

/// Wallet ledger as seen by Bet Placement and the worker.
///
/// # Errors
/// Returns an error if the wallet URL is invalid.
pub fn wallet_gateway(config: &Config, pool: &DbPool) -> Result<Arc<dyn WalletGateway>> {
    Ok(match config.wallet.mode {
        WalletMode::Http => Arc::new(HttpWalletClient::new(
            &config.wallet.url,
            config.wallet.timeout(),
        )?),
        WalletMode::Local => Arc::new(SqliteLedger::new(pool.clone())),
    })
}

pub fn odds_cache(config: &Config, pool: &DbPool) -> Arc<dyn OddsCache> {
    match config.odds.backend {
        OddsBackend::Sqlite => Arc::new(SqliteOddsCache::new(pool.clone())),
        OddsBackend::Memory => Arc::new(MemoryOddsCache::new()),
        OddsBackend::None => Arc::new(NoOddsCache),
    }
}

#[must_use]
pub fn event_log(config: &Config, pool: &DbPool) -> Arc<SqliteEventLog> {
    Arc::new(SqliteEventLog::new(pool.clone(), config.bus.partitions))
}

/// Wire the PlaceBet use case.
///
/// # Errors
/// Returns an error if the wallet client cannot be built.
pub fn placement(config: &Config, pool: &DbPool) -> Result<BetPlacement> {
    Ok(BetPlacement::new(
        Arc::new(SqliteBetStore::new(pool.clone())),
        wallet_gateway(config, pool)?,
        event_log(config, pool),
        odds_cache(config, pool),
        config.bus.topics.clone(),
    ))
}

/// Consumer of `bet_placed` for this worker instance.
#[must_use]
pub fn consumer(config: &Config, pool: &DbPool) -> SqliteConsumer {
    let topic = config.bus.topics.bet_placed.clone();
    match &config.worker.partitions {
        Some(assigned) => {
            SqliteConsumer::assigned(pool.clone(), &config.worker.group, topic, assigned.clone())
        }
        None => SqliteConsumer::new(
            pool.clone(),
            &config.worker.group,
            topic,
            config.bus.partitions,
        ),
    }
}

/// Wire the confirmation worker.
///
/// # Errors
/// Returns an error if the wallet or supplier client cannot be built.
pub fn worker(config: &Config, pool: &DbPool) -> Result<ConfirmationWorker> {
    let supplier = HttpSupplier::new(&config.supplier.url, config.supplier.timeout())?;
    Ok(ConfirmationWorker::new(
        Arc::new(consumer(config, pool)),
        event_log(config, pool),
        Arc::new(SqliteBetStore::new(pool.clone())),
        wallet_gateway(config, pool)?,
        Arc::new(supplier),
        config
            .worker
            .settings(config.supplier.timeout(), &config.bus.topics),
    ))
}

/// Run `serve wallet` until shutdown.
///
/// # Errors
/// Returns an error if startup fails or the server stops abnormally.
pub async fn run_wallet_service(config: &Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    let pool = open_database(config)?;
    let ledger = Arc::new(SqliteLedger::new(pool));
    let router = http::wallet::router(ledger.clone(), ledger);
    http::serve("wallet", &config.wallet.bind, router, shutdown).await
}

/// Run `serve bets` until shutdown.
///
/// # Errors
/// Returns an error if startup fails or the server stops abnormally.
pub async fn run_bets_service(config: &Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    let pool = open_database(config)?;
    let placement = Arc::new(placement(config, &pool)?);
    http::serve(
        "bets",
        &config.bets.bind,
        http::bets::router(placement),
        shutdown,
    )
    .await
}

/// Run `serve supplier` until shutdown.
///
/// # Errors
/// Returns an error if the probability is invalid or the server stops
/// abnormally.
pub async fn run_supplier_service(
    config: &Config,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let supplier = Arc::new(RandomSupplier::new(config.supplier.accept_probability)?);
    http::serve(
        "supplier",
        &config.supplier.bind,
        http::supplier::router(supplier),
        shutdown,
    )
    .await
}

/// Run the confirmation worker until shutdown.
///
/// # Errors
/// Returns an error if startup fails.
pub async fn run_worker(config: &Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    let pool = open_database(config)?;
    let worker = worker(config, &pool)?;
    info!(
        group = %config.worker.group,
        partitions = ?config.worker.partitions,
        supplier = %config.supplier.url,
        "Starting confirmation worker"
    );
    worker.run(shutdown).await
}
