//! Per-service configuration sections: storage, bus, the three HTTP
//! services, the worker and the odds cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::{RetryPolicy, WorkerSettings};
use crate::domain::Topics;

/// SQLite database settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file shared by every process.
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "betsettle.db".into(),
            pool_size: 5,
        }
    }
}

/// Event log settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Partition count per topic. Changing it re-routes keys.
    pub partitions: u32,
    pub topics: Topics,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            partitions: 4,
            topics: Topics::default(),
        }
    }
}

/// How Bet Placement and the worker reach the wallet ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletMode {
    /// Call the wallet service over HTTP.
    #[default]
    Http,
    /// Use the SQLite ledger directly in-process.
    Local,
}

/// Wallet ledger service and client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletServiceConfig {
    /// Address `serve wallet` binds to.
    pub bind: String,
    /// Base URL clients call.
    pub url: String,
    pub mode: WalletMode,
    pub timeout_ms: u64,
}

impl WalletServiceConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for WalletServiceConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8081".into(),
            url: "http://127.0.0.1:8081".into(),
            mode: WalletMode::Http,
            timeout_ms: 5_000,
        }
    }
}

/// Bet placement service settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BetsServiceConfig {
    pub bind: String,
}

impl Default for BetsServiceConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".into(),
        }
    }
}

/// Confirmation worker settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Consumer group the worker commits offsets under.
    pub group: String,
    /// Partitions this instance owns. All partitions when unset.
    pub partitions: Option<Vec<i32>>,
    pub max_retries: u32,
    pub backoff_step_ms: u64,
    pub poll_interval_ms: u64,
    pub error_backoff_ms: u64,
}

impl WorkerConfig {
    /// Loop settings for the worker, combined with the supplier deadline
    /// and the bus topic names.
    #[must_use]
    pub fn settings(&self, supplier_timeout: Duration, topics: &Topics) -> WorkerSettings {
        WorkerSettings {
            retry: RetryPolicy {
                max_retries: self.max_retries,
                backoff_step: Duration::from_millis(self.backoff_step_ms),
                call_timeout: supplier_timeout,
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            error_backoff: Duration::from_millis(self.error_backoff_ms),
            topics: topics.clone(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            group: "bet-confirmation-worker".into(),
            partitions: None,
            max_retries: 3,
            backoff_step_ms: 300,
            poll_interval_ms: 200,
            error_backoff_ms: 500,
        }
    }
}

/// Supplier simulator and client settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SupplierConfig {
    pub bind: String,
    pub url: String,
    pub timeout_ms: u64,
    /// Chance the simulator confirms a bet.
    pub accept_probability: f64,
}

impl SupplierConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SupplierConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8082".into(),
            url: "http://127.0.0.1:8082".into(),
            timeout_ms: 5_000,
            accept_probability: 0.8,
        }
    }
}

/// Odds cache backend used by Bet Placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OddsBackend {
    /// Snapshots table in the shared database.
    #[default]
    Sqlite,
    /// Process-local map.
    Memory,
    /// No cache; every submitted odd is trusted.
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OddsConfig {
    pub backend: OddsBackend,
}
