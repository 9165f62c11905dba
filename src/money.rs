//! Fixed-point money amounts.
//!
//! Amounts are held as [Decimal] in memory and stored as integer minor units
//! (cents) in the database so that sums never pick up binary floating point
//! drift.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::Error;

/// The number of decimal places kept for money amounts.
pub const MINOR_UNIT_DIGITS: u32 = 2;

/// Check that `amount` is a valid money amount.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] if `amount` is negative or has more than
/// [MINOR_UNIT_DIGITS] decimal places.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidAmount(amount));
    }

    if amount.normalize().scale() > MINOR_UNIT_DIGITS {
        return Err(Error::InvalidAmount(amount));
    }

    Ok(amount)
}

/// Convert `amount` to a whole number of minor units, e.g. dollars to cents.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] if `amount` has more than
/// [MINOR_UNIT_DIGITS] decimal places or does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, Error> {
    let scaled = amount * Decimal::ONE_HUNDRED;

    if !scaled.fract().is_zero() {
        return Err(Error::InvalidAmount(amount));
    }

    scaled.to_i64().ok_or(Error::InvalidAmount(amount))
}

/// Convert a whole number of minor units back into an amount.
pub fn from_minor_units(minor_units: i64) -> Decimal {
    Decimal::new(minor_units, MINOR_UNIT_DIGITS)
}

/// Express `part` as a percentage of `whole`, truncated to two decimal places.
///
/// Truncating means shares of the same whole never add up to more than 100.
/// Returns zero when `whole` is not positive instead of dividing by zero.
pub fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    (part / whole * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(MINOR_UNIT_DIGITS, RoundingStrategy::ToZero)
}
