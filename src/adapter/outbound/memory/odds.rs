//! Process-local odds cache.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::Odd;
use crate::error::Result;
use crate::port::outbound::{OddsCache, OddsKey};

/// Thread-safe odds cache held in memory.
///
/// Used by simulations and tests in place of the shared snapshot table.
#[derive(Debug, Default)]
pub struct MemoryOddsCache {
    quotes: DashMap<OddsKey, Odd>,
}

impl MemoryOddsCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quote `odd` for `key`.
    pub fn put(&self, key: OddsKey, odd: Odd) {
        self.quotes.insert(key, odd);
    }

    /// Withdraw the quote for `key`.
    pub fn remove(&self, key: &OddsKey) -> Option<Odd> {
        self.quotes.remove(key).map(|(_, odd)| odd)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

#[async_trait]
impl OddsCache for MemoryOddsCache {
    async fn current_odd(&self, key: &OddsKey) -> Result<Option<Odd>> {
        Ok(self.quotes.get(key).map(|entry| *entry.value()))
    }
}
