//! Supplier stand-ins.

pub mod simulated;

pub use simulated::RandomSupplier;
