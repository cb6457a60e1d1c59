//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors from price arithmetic.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PriceError {
    /// Amounts in different currencies cannot be combined.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left operand.
        left: CurrencyCode,
        /// Currency of the right operand.
        right: CurrencyCode,
    },
    /// A discount percentage outside 0-100 was applied.
    #[error("invalid discount percent: {0}")]
    InvalidDiscount(i32),
    /// The operation overflowed the decimal range.
    #[error("price arithmetic overflow")]
    Overflow,
}

/// A price with currency information.
///
/// Amounts are stored in the currency's standard unit (e.g. pounds, not
/// piastres) as a [`Decimal`] so cart and order arithmetic never loses cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Add another price of the same currency.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::CurrencyMismatch` if the currencies differ and
    /// `PriceError::Overflow` if the sum does not fit in a `Decimal`.
    pub fn checked_add(self, other: Self) -> Result<Self, PriceError> {
        if self.currency != other.currency {
            return Err(PriceError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(PriceError::Overflow)?;
        Ok(Self::new(amount, self.currency))
    }

    /// Multiply by a quantity.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the product does not fit in a `Decimal`.
    pub fn checked_mul(self, quantity: u32) -> Result<Self, PriceError> {
        let amount = self
            .amount
            .checked_mul(Decimal::from(quantity))
            .ok_or(PriceError::Overflow)?;
        Ok(Self::new(amount, self.currency))
    }

    /// Apply a percentage discount (0-100), rounding to 2 decimal places.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::InvalidDiscount` if the percentage is outside 0-100.
    pub fn apply_discount_percent(self, percent: i32) -> Result<Self, PriceError> {
        if !(0..=100).contains(&percent) {
            return Err(PriceError::InvalidDiscount(percent));
        }
        let keep = Decimal::from(100 - percent) / Decimal::ONE_HUNDRED;
        let amount = self
            .amount
            .checked_mul(keep)
            .ok_or(PriceError::Overflow)?
            .round_dp(2);
        Ok(Self::new(amount, self.currency))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency.code())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Egyptian pound.
    #[default]
    EGP,
    /// Saudi riyal.
    SAR,
    /// UAE dirham.
    AED,
    /// US dollar.
    USD,
    /// Euro.
    EUR,
}

impl CurrencyCode {
    /// ISO 4217 code as a string.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EGP => "EGP",
            Self::SAR => "SAR",
            Self::AED => "AED",
            Self::USD => "USD",
            Self::EUR => "EUR",
        }
    }

    /// Parse an ISO 4217 code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "EGP" => Some(Self::EGP),
            "SAR" => Some(Self::SAR),
            "AED" => Some(Self::AED),
            "USD" => Some(Self::USD),
            "EUR" => Some(Self::EUR),
            _ => None,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_checked_add_same_currency() {
        let a = Price::new(dec!(10.50), CurrencyCode::EGP);
        let b = Price::new(dec!(4.25), CurrencyCode::EGP);
        let sum = a.checked_add(b).expect("same currency");
        assert_eq!(sum.amount, dec!(14.75));
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let a = Price::new(dec!(10), CurrencyCode::EGP);
        let b = Price::new(dec!(10), CurrencyCode::USD);
        assert_eq!(
            a.checked_add(b),
            Err(PriceError::CurrencyMismatch {
                left: CurrencyCode::EGP,
                right: CurrencyCode::USD,
            })
        );
    }

    #[test]
    fn test_checked_mul() {
        let unit = Price::new(dec!(19.99), CurrencyCode::EGP);
        let line = unit.checked_mul(3).expect("no overflow");
        assert_eq!(line.amount, dec!(59.97));
    }

    #[test]
    fn test_apply_discount_percent() {
        let total = Price::new(dec!(200), CurrencyCode::EGP);
        let discounted = total.apply_discount_percent(15).expect("valid percent");
        assert_eq!(discounted.amount, dec!(170.00));
    }

    #[test]
    fn test_apply_discount_rounds_to_cents() {
        let total = Price::new(dec!(99.99), CurrencyCode::EGP);
        let discounted = total.apply_discount_percent(33).expect("valid percent");
        assert_eq!(discounted.amount, dec!(66.99));
    }

    #[test]
    fn test_apply_discount_out_of_range() {
        let total = Price::new(dec!(100), CurrencyCode::EGP);
        assert_eq!(
            total.apply_discount_percent(101),
            Err(PriceError::InvalidDiscount(101))
        );
        assert_eq!(
            total.apply_discount_percent(-1),
            Err(PriceError::InvalidDiscount(-1))
        );
    }

    #[test]
    fn test_display() {
        let p = Price::new(dec!(49.9), CurrencyCode::EGP);
        assert_eq!(p.to_string(), "49.90 EGP");
    }

    #[test]
    fn test_currency_code_round_trip() {
        for currency in [
            CurrencyCode::EGP,
            CurrencyCode::SAR,
            CurrencyCode::AED,
            CurrencyCode::USD,
            CurrencyCode::EUR,
        ] {
            assert_eq!(CurrencyCode::from_code(currency.code()), Some(currency));
        }
        assert_eq!(CurrencyCode::from_code("XYZ"), None);
    }
}
