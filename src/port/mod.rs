//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!   HTTP / CLI ──►│ BetPlacement   Confirmation  │
//!                 │                Worker        │
//!                 └──────┬──────────┬────────┬───┘
//!                        ▼          ▼        ▼
//!                 WalletGateway  EventBus  Supplier
//!                 BetStore       OddsCache
//! ```

pub mod outbound;
