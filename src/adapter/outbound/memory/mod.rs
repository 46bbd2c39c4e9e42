//! In-process adapters.

pub mod odds;

pub use odds::MemoryOddsCache;
