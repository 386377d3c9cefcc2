//! Type-safe price representation using decimal arithmetic.
//!
//! Prices never pass through floating point: amounts are `rust_decimal`
//! values and line subtotals are computed with exact multiplication.
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use solemate_core::{CurrencyCode, Price};
//!
//! let price = Price::new(Decimal::new(10000, 2), CurrencyCode::BRL);
//! assert_eq!(price.display(), "R$100.00");
//! assert_eq!(price.times(3).display(), "R$300.00");
//! ```

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of fractional digits shown when formatting a price.
const DISPLAY_SCALE: u32 = 2;

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., reais, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
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
        Self::new(Decimal::ZERO, currency_code)
    }

    /// The price of `quantity` units at this unit price.
    ///
    /// # Panics
    ///
    /// Panics if the product overflows `Decimal`; use
    /// [`checked_times`](Self::checked_times) for untrusted quantities.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Like [`times`](Self::times), returning `None` on overflow.
    #[must_use]
    pub fn checked_times(&self, quantity: u32) -> Option<Self> {
        self.amount
            .checked_mul(Decimal::from(quantity))
            .map(|amount| Self::new(amount, self.currency_code))
    }

    /// Sum a sequence of amounts into a single price in `currency_code`.
    ///
    /// Returns zero for an empty sequence.
    ///
    /// # Panics
    ///
    /// Panics if the sum overflows `Decimal`.
    pub fn total<I>(currency_code: CurrencyCode, amounts: I) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        Self::new(amounts.into_iter().sum(), currency_code)
    }

    /// Format for display (e.g., "R$19.99").
    ///
    /// The amount is rounded half away from zero to two decimal places.
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .amount
            .round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        write!(
            f,
            "{}{:.prec$}",
            self.currency_code.symbol(),
            rounded,
            prec = DISPLAY_SCALE as usize
        )
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    BRL,
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol placed before the amount.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::BRL => "R$",
            Self::USD => "$",
            Self::CAD => "CA$",
            Self::AUD => "A$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

/// Error returned when a string is not a supported currency code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency code: {0}")]
pub struct ParseCurrencyError(pub String);

impl FromStr for CurrencyCode {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BRL" => Ok(Self::BRL),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            _ => Err(ParseCurrencyError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brl(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2), CurrencyCode::BRL)
    }

    #[test]
    fn test_display_pads_to_two_places() {
        assert_eq!(brl(10000).display(), "R$100.00");
        assert_eq!(Price::new(Decimal::new(5, 0), CurrencyCode::BRL).display(), "R$5.00");
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        let price = Price::new(Decimal::new(19995, 3), CurrencyCode::USD);
        assert_eq!(price.display(), "$20.00");
        let price = Price::new(Decimal::new(19994, 3), CurrencyCode::USD);
        assert_eq!(price.display(), "$19.99");
    }

    #[test]
    fn test_times_is_exact() {
        assert_eq!(brl(1990).times(3).amount, Decimal::new(5970, 2));
        assert_eq!(brl(1990).times(0).amount, Decimal::ZERO);
    }

    #[test]
    fn test_checked_times_reports_overflow() {
        assert_eq!(brl(1990).checked_times(3), Some(brl(5970)));
        assert_eq!(Price::new(Decimal::MAX, CurrencyCode::BRL).checked_times(2), None);

        let huge = Price::new(Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0), CurrencyCode::BRL);
        assert_eq!(huge.checked_times(1_000_000_000), None);
    }

    #[test]
    fn test_total_of_nothing_is_zero() {
        let total = Price::total(CurrencyCode::EUR, std::iter::empty());
        assert_eq!(total, Price::zero(CurrencyCode::EUR));
        assert_eq!(total.display(), "€0.00");
    }

    #[test]
    fn test_total_sums_amounts() {
        let total = Price::total(
            CurrencyCode::BRL,
            [Decimal::new(10000, 2), Decimal::new(5050, 2)],
        );
        assert_eq!(total.display(), "R$150.50");
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("brl".parse::<CurrencyCode>(), Ok(CurrencyCode::BRL));
        assert_eq!(" GBP ".parse::<CurrencyCode>(), Ok(CurrencyCode::GBP));
        assert!(matches!(
            "XYZ".parse::<CurrencyCode>(),
            Err(ParseCurrencyError(code)) if code == "XYZ"
        ));
    }

    #[test]
    fn test_default_currency_is_brl() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::BRL);
        assert_eq!(CurrencyCode::default().symbol(), "R$");
    }
}
