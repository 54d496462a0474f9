//! Type-safe money representation using decimal arithmetic.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when combining [`Money`] values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The two operands carry different currencies.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left operand.
        left: CurrencyCode,
        /// Currency of the right operand.
        right: CurrencyCode,
    },
}

/// A monetary amount with currency information.
///
/// Amounts use exact decimal arithmetic; floating point never touches money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// Create an amount from a whole number of major units.
    #[must_use]
    pub fn from_major(units: i64, currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::from(units),
            currency_code,
        }
    }

    /// Whether this amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Add another amount in the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] if the currencies differ.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        if self.currency_code != other.currency_code {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency_code,
                right: other.currency_code,
            });
        }
        Ok(Self {
            amount: self.amount + other.amount,
            currency_code: self.currency_code,
        })
    }

    /// Subtract another amount in the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] if the currencies differ.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        if self.currency_code != other.currency_code {
            return Err(MoneyError::CurrencyMismatch {
                left: self.currency_code,
                right: other.currency_code,
            });
        }
        Ok(Self {
            amount: self.amount - other.amount,
            currency_code: self.currency_code,
        })
    }

    /// Multiply by a unitless quantity (e.g., a line item count).
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self {
            amount: self.amount * Decimal::from(quantity),
            currency_code: self.currency_code,
        }
    }

    /// Multiply by a unitless decimal factor (e.g., a discount rate).
    #[must_use]
    pub fn scale(&self, factor: Decimal) -> Self {
        Self {
            amount: self.amount * factor,
            currency_code: self.currency_code,
        }
    }

    /// Round to two decimal places, half away from zero.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            amount: self
                .amount
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            currency_code: self.currency_code,
        }
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    INR,
}

impl CurrencyCode {
    /// The display symbol for this currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "\u{20ac}",
            Self::GBP => "\u{a3}",
            Self::INR => "\u{20b9}",
        }
    }

    /// The ISO 4217 code for this currency.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::INR => "INR",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            "INR" => Ok(Self::INR),
            _ => Err(format!("invalid currency code: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_add_same_currency() {
        let a = Money::new(Decimal::new(1050, 2), CurrencyCode::USD);
        let b = Money::new(Decimal::new(425, 2), CurrencyCode::USD);
        let sum = a.checked_add(b).unwrap();
        assert_eq!(sum.amount, Decimal::new(1475, 2));
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let a = Money::from_major(10, CurrencyCode::USD);
        let b = Money::from_major(10, CurrencyCode::EUR);
        assert!(matches!(
            a.checked_add(b),
            Err(MoneyError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_times_quantity() {
        let unit = Money::new(Decimal::new(129_999, 2), CurrencyCode::USD);
        assert_eq!(unit.times(3).amount, Decimal::new(389_997, 2));
    }

    #[test]
    fn test_scale_and_round() {
        let subtotal = Money::from_major(42_000, CurrencyCode::USD);
        let discount = subtotal.scale(Decimal::new(10, 2)).rounded();
        assert_eq!(discount.amount, Decimal::from(4200));
    }

    #[test]
    fn test_rounded_half_away_from_zero() {
        let m = Money::new(Decimal::new(10_005, 3), CurrencyCode::USD);
        assert_eq!(m.rounded().amount, Decimal::new(1001, 2));
    }

    #[test]
    fn test_display() {
        let m = Money::new(Decimal::new(1999, 2), CurrencyCode::USD);
        assert_eq!(m.to_string(), "$19.99");
        assert_eq!(
            Money::from_major(5, CurrencyCode::GBP).to_string(),
            "\u{a3}5.00"
        );
    }

    #[test]
    fn test_currency_code_round_trip() {
        let code: CurrencyCode = "INR".parse().unwrap();
        assert_eq!(code, CurrencyCode::INR);
        assert_eq!(code.to_string(), "INR");
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_serde_amount_as_string() {
        let m = Money::new(Decimal::new(1999, 2), CurrencyCode::USD);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"amount":"19.99","currency_code":"USD"}"#);

        let parsed: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, m);
    }
}
