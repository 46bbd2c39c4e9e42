//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; a handful of deployment
//! values can be overridden from the environment (after `.env` is loaded
//! by the binary).
//!
//! # Example
//!
//! ```no_run
//! use betsettle::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default("betsettle.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::logging::LoggingConfig;
use super::service::{
    BetsServiceConfig, BusConfig, DatabaseConfig, OddsConfig, SupplierConfig, WalletServiceConfig,
    WorkerConfig,
};
use crate::error::{ConfigError, Result};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "betsettle.toml";

/// Upper bound on bus partitions per topic.
pub const MAX_PARTITIONS: u32 = 1024;

pub const ENV_DATABASE: &str = "BETSETTLE_DATABASE";
pub const ENV_WALLET_URL: &str = "BETSETTLE_WALLET_URL";
pub const ENV_SUPPLIER_URL: &str = "BETSETTLE_SUPPLIER_URL";
pub const ENV_LOG_LEVEL: &str = "BETSETTLE_LOG_LEVEL";

/// Main application configuration.
///
/// Every section has defaults, so an empty file (or no file) yields a
/// runnable local setup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Logging and tracing configuration.
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    /// Event log partitioning and topic names.
    pub bus: BusConfig,
    pub wallet: WalletServiceConfig,
    pub bets: BetsServiceConfig,
    /// Confirmation worker loop and retry settings.
    pub worker: WorkerConfig,
    pub supplier: SupplierConfig,
    pub odds: OddsConfig,
}

impl Config {
    /// Parse and validate configuration from TOML content.
    ///
    /// Environment overrides are not applied here.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or a value is out
    /// of range.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file is unreadable or invalid.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        debug!(path = %path.display(), "Config file not found, using defaults");
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply deployment overrides from `lookup` (normally the process
    /// environment). Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(path) = get(ENV_DATABASE) {
            self.database.path = path;
        }
        if let Some(url) = get(ENV_WALLET_URL) {
            self.wallet.url = url;
        }
        if let Some(url) = get(ENV_SUPPLIER_URL) {
            self.supplier.url = url;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.path",
            }
            .into());
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.pool_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.bus.partitions == 0 || self.bus.partitions > MAX_PARTITIONS {
            return Err(ConfigError::InvalidValue {
                field: "bus.partitions",
                reason: format!("must be between 1 and {MAX_PARTITIONS}"),
            }
            .into());
        }
        let topics = &self.bus.topics;
        for (field, name) in [
            ("bus.topics.bet_placed", &topics.bet_placed),
            ("bus.topics.bet_confirmed", &topics.bet_confirmed),
            ("bus.topics.bet_placed_dlq", &topics.bet_placed_dlq),
            ("bus.topics.bet_confirmed_dlq", &topics.bet_confirmed_dlq),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::MissingField { field }.into());
            }
        }

        if !self.logging.is_known_format() {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: "must be 'pretty' or 'json'".to_string(),
            }
            .into());
        }

        if self.wallet.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "wallet.timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.supplier.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "supplier.timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if !(0.0..=1.0).contains(&self.supplier.accept_probability) {
            return Err(ConfigError::InvalidValue {
                field: "supplier.accept_probability",
                reason: "must be between 0 and 1".to_string(),
            }
            .into());
        }

        if self.worker.group.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "worker.group",
            }
            .into());
        }
        if self.worker.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker.poll_interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if let Some(assigned) = &self.worker.partitions {
            if assigned.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "worker.partitions",
                    reason: "must list at least one partition when set".to_string(),
                }
                .into());
            }
            let limit = i64::from(self.bus.partitions);
            if let Some(bad) = assigned.iter().find(|p| **p < 0 || i64::from(**p) >= limit) {
                return Err(ConfigError::InvalidValue {
                    field: "worker.partitions",
                    reason: format!("partition {bad} outside 0..{limit}"),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self).map_err(ConfigError::Render)?)
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
