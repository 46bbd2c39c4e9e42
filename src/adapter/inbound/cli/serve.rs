//! Handlers for the long-running processes: `serve`, `worker`, `migrate`.

use crate::adapter::inbound::cli::command::Service;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;
use crate::infrastructure::shutdown::Shutdown;

/// Execute `serve <service>`.
pub async fn execute_serve(config: &Config, service: Service) -> Result<()> {
    let (shutdown, rx) = Shutdown::channel();
    shutdown.trigger_on_signal();
    match service {
        Service::Wallet => bootstrap::run_wallet_service(config, rx).await,
        Service::Bets => bootstrap::run_bets_service(config, rx).await,
        Service::Supplier => bootstrap::run_supplier_service(config, rx).await,
    }
}

/// Execute `worker`.
pub async fn execute_worker(config: &Config) -> Result<()> {
    let (shutdown, rx) = Shutdown::channel();
    shutdown.trigger_on_signal();
    bootstrap::run_worker(config, rx).await
}

/// Execute `migrate`.
pub fn execute_migrate(config: &Config) -> Result<()> {
    bootstrap::open_database(config)?;
    output::success("Database schema is up to date");
    output::field("Database", &config.database.path);
    Ok(())
}
