//! Domain validation errors.
//!
//! These are raised before any state is touched: a request that fails
//! validation is rejected immediately and never retried.
//!
//! # Examples
//!
//! ```
//! use betsettle::domain::error::DomainError;
//! use betsettle::domain::money::ensure_positive_cents;
//!
//! let result = ensure_positive_cents("amountCents", 0);
//! assert!(matches!(result, Err(DomainError::NonPositiveAmount { amount: 0, .. })));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Money amounts must be strictly positive.
    #[error("{field} must be positive, got {amount}")]
    NonPositiveAmount {
        /// Name of the offending field.
        field: &'static str,
        /// The invalid amount.
        amount: i64,
    },

    /// Odd values must be strictly positive.
    #[error("odd value must be positive, got {odd}")]
    NonPositiveOdd {
        /// The invalid odd.
        odd: Decimal,
    },

    /// A required field was empty or missing.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A status string did not name a known state.
    #[error("unknown {kind} status '{value}'")]
    UnknownStatus {
        /// The entity the status belongs to.
        kind: &'static str,
        /// The unrecognized value.
        value: String,
    },
}
