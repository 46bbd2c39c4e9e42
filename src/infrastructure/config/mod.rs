//! Infrastructure configuration modules.

pub mod logging;
pub mod service;
pub mod settings;

pub use logging::LoggingConfig;
pub use service::{
    BetsServiceConfig, BusConfig, DatabaseConfig, OddsBackend, OddsConfig, SupplierConfig,
    WalletMode, WalletServiceConfig, WorkerConfig,
};
pub use settings::{Config, DEFAULT_CONFIG_PATH};
