//! Odds cache port.
//!
//! Placement consults the cache on a best-effort basis only: a miss or an
//! error never blocks a bet.

use std::fmt;

use async_trait::async_trait;

use crate::domain::Odd;
use crate::error::Result;

/// Identifies a quoted selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OddsKey {
    pub event_id: String,
    pub market: String,
    pub selection: String,
}

impl OddsKey {
    pub fn new(
        event_id: impl Into<String>,
        market: impl Into<String>,
        selection: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            market: market.into(),
            selection: selection.into(),
        }
    }
}

impl fmt::Display for OddsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "odds:{}:{}:{}", self.event_id, self.market, self.selection)
    }
}

/// Source of currently quoted odds.
#[async_trait]
pub trait OddsCache: Send + Sync {
    /// Current odd for `key`, or `None` when nothing is quoted.
    async fn current_odd(&self, key: &OddsKey) -> Result<Option<Odd>>;
}

/// Cache that never knows anything. Placement then trusts the submitted odd.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOddsCache;

#[async_trait]
impl OddsCache for NoOddsCache {
    async fn current_odd(&self, _key: &OddsKey) -> Result<Option<Odd>> {
        Ok(None)
    }
}
