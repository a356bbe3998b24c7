//! Money handling using decimal arithmetic.
//!
//! Cart prices are kept as [`Decimal`] amounts in the currency's standard unit
//! (euros, not cents). The payment provider only accepts integer amounts in
//! the smallest currency unit, so [`to_minor_units`] performs that conversion
//! at the checkout boundary.
//!
//! The storefront is single-currency: every amount is implicitly [`Currency::EUR`].

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An amount expressed in minor currency units (e.g. cents).
pub type MinorUnits = u64;

/// Errors converting a decimal amount to minor units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Negative amounts cannot be charged.
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
    /// The amount does not fit in the minor-unit integer type.
    #[error("amount is too large: {0}")]
    Overflow(Decimal),
}

/// ISO 4217 currency code.
///
/// Only one currency is supported; the enum exists so the wire value sent to
/// the payment provider is spelled in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    EUR,
}

impl Currency {
    /// Lowercase code, as the payment provider expects it.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EUR => "eur",
        }
    }

    /// Decimal places between major and minor units (2 for cents).
    #[must_use]
    pub const fn minor_unit_exponent(self) -> u32 {
        match self {
            Self::EUR => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Convert a major-unit amount to minor units of the default currency.
///
/// Sub-cent remainders are rounded half away from zero, so `8.555` becomes
/// `856`.
///
/// # Errors
///
/// Returns [`MoneyError::Negative`] for negative amounts and
/// [`MoneyError::Overflow`] when the result does not fit in a `u64`.
pub fn to_minor_units(amount: Decimal) -> Result<MinorUnits, MoneyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative(amount));
    }

    let scale = Decimal::from(10_u64.pow(Currency::default().minor_unit_exponent()));
    amount
        .checked_mul(scale)
        .map(|scaled| {
            scaled.round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
        })
        .and_then(|rounded| rounded.to_u64())
        .ok_or(MoneyError::Overflow(amount))
}
