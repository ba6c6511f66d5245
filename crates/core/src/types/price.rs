//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are non-negative decimal amounts in the store currency (USD).
//! Stored values keep full precision; rounding to two decimals happens only
//! at the display boundary via [`Price::display`].

use std::iter::Sum;
use std::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is negative.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative monetary amount.
///
/// Arithmetic on prices stays in `Decimal` space, so intermediate totals
/// (e.g. a taxed order total of 26.8125) are exact. Two-decimal rounding is
/// applied only when formatting for display.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        #[allow(clippy::cast_possible_wrap)] // u64 cents never exceed i64::MAX in practice
        Self(Decimal::from_parts(
            (cents & 0xFFFF_FFFF) as u32,
            (cents >> 32) as u32,
            0,
            false,
            2,
        ))
    }

    /// The underlying decimal amount at full precision.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this price is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Apply a fractional rate (e.g. a tax rate of `0.0725`) additively,
    /// returning `amount * (1 + rate)` at full precision.
    #[must_use]
    pub fn with_rate(&self, rate: Decimal) -> Self {
        Self(self.0 * (Decimal::ONE + rate))
    }

    /// Format for display with a dollar sign and two decimals (half-up).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("${rounded:.2}")
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_rejects_negative() {
        assert!(matches!(
            Price::new(dec("-0.01")),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::new(Decimal::ZERO).is_ok());
        assert!(Price::new(dec("19.99")).is_ok());
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(1999).amount(), dec("19.99"));
        assert_eq!(Price::from_cents(0), Price::ZERO);
    }

    #[test]
    fn test_arithmetic() {
        let p = Price::new(dec("10.00")).unwrap();
        assert_eq!((p * 3).amount(), dec("30.00"));
        assert_eq!((p + Price::from_cents(500)).amount(), dec("15.00"));

        let total: Price = [p * 2, Price::from_cents(500)].into_iter().sum();
        assert_eq!(total.amount(), dec("25.00"));
    }

    #[test]
    fn test_with_rate_keeps_full_precision() {
        let subtotal = Price::new(dec("25.00")).unwrap();
        let total = subtotal.with_rate(dec("0.0725"));
        assert_eq!(total.amount(), dec("26.812500"));
    }

    #[test]
    fn test_display_rounds_half_up_to_two_decimals() {
        let total = Price::new(dec("26.8125")).unwrap();
        assert_eq!(total.display(), "$26.81");
        assert_eq!(Price::new(dec("26.815")).unwrap().display(), "$26.82");
        assert_eq!(Price::ZERO.display(), "$0.00");
    }

    #[test]
    fn test_serde_roundtrip() {
        let p = Price::from_cents(1050);
        let json = serde_json::to_string(&p).unwrap();
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
