//! Monetary and odds representation.

use rust_decimal::Decimal;

use super::error::DomainError;

/// Money in integer cents. Never fractional.
pub type Cents = i64;

/// Decimal odd quoted for a selection.
pub type Odd = Decimal;

/// Reject zero and negative amounts.
///
/// # Errors
/// Returns [`DomainError::NonPositiveAmount`] when `amount <= 0`.
pub fn ensure_positive_cents(field: &'static str, amount: Cents) -> Result<Cents, DomainError> {
    if amount <= 0 {
        return Err(DomainError::NonPositiveAmount { field, amount });
    }
    Ok(amount)
}

/// Reject zero and negative odds.
///
/// # Errors
/// Returns [`DomainError::NonPositiveOdd`] when `odd <= 0`.
pub fn ensure_positive_odd(odd: Odd) -> Result<Odd, DomainError> {
    if odd <= Decimal::ZERO {
        return Err(DomainError::NonPositiveOdd { odd });
    }
    Ok(odd)
}
