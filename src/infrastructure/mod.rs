//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic: configuration, logging, process wiring and shutdown.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`shutdown`] - Cooperative shutdown signal

pub mod bootstrap;
pub mod config;
pub mod shutdown;
