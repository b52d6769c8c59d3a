//! Ugandan shilling amounts using decimal arithmetic.
//!
//! The shilling has no fractional subunit in circulation, so display always
//! rounds to whole shillings. Arithmetic keeps full decimal precision until a
//! caller explicitly asks for [`Ugx::round_whole`].

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul, Sub};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Ugx`] amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UgxError {
    /// The input string is empty.
    #[error("amount cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("amount is not a number: {0}")]
    NotANumber(String),
    /// The amount is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount is above [`Ugx::MAX_SHILLINGS`].
    #[error("amount cannot exceed {max} shillings")]
    TooLarge { max: i64 },
}

/// An amount of Ugandan shillings.
///
/// Serialized as a JSON number, which is what the marketplace API sends and
/// expects for prices and shipping costs.
///
/// ## Examples
///
/// ```
/// use katale_core::Ugx;
///
/// let price = Ugx::from_shillings(25_000);
/// assert_eq!((price * 2).to_string(), "UGX 50,000");
/// assert!("abc".parse::<Ugx>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ugx(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Ugx {
    /// Zero shillings.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// ISO 4217 currency code.
    pub const CURRENCY_CODE: &'static str = "UGX";

    /// Largest amount accepted from outside input (one trillion shillings).
    /// Keeps cart totals far from the limits of `Decimal` arithmetic.
    pub const MAX_SHILLINGS: i64 = 1_000_000_000_000;

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from whole shillings.
    #[must_use]
    pub fn from_shillings(shillings: i64) -> Self {
        Self(Decimal::from(shillings))
    }

    /// Returns the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Round to the nearest whole shilling, halves away from zero.
    #[must_use]
    pub fn round_whole(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns `true` if the amount is above [`Ugx::MAX_SHILLINGS`].
    #[must_use]
    pub fn exceeds_max(&self) -> bool {
        self.0 > Decimal::from(Self::MAX_SHILLINGS)
    }

    /// Multiply by a decimal rate (e.g. a tax rate of `0.18`).
    #[must_use]
    pub fn scale(&self, rate: Decimal) -> Self {
        Self(self.0 * rate)
    }

    /// Parse an amount entered by a person or read from configuration.
    ///
    /// Accepts plain digits with optional `,` or `_` grouping and an optional
    /// `UGX` prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not a number, negative, or
    /// above [`Ugx::MAX_SHILLINGS`].
    pub fn parse(s: &str) -> Result<Self, UgxError> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix(Self::CURRENCY_CODE)
            .unwrap_or(trimmed)
            .trim();
        if trimmed.is_empty() {
            return Err(UgxError::Empty);
        }

        let digits: String = trimmed.chars().filter(|c| !matches!(c, ',' | '_')).collect();
        let amount: Decimal = digits
            .parse()
            .map_err(|_| UgxError::NotANumber(s.to_owned()))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(UgxError::Negative);
        }

        let amount = Self(amount);
        if amount.exceeds_max() {
            return Err(UgxError::TooLarge {
                max: Self::MAX_SHILLINGS,
            });
        }
        Ok(amount)
    }
}

impl fmt::Display for Ugx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.round_whole().0;
        let digits = whole.abs().trunc().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if whole.is_sign_negative() && !whole.is_zero() {
            "-"
        } else {
            ""
        };
        write!(f, "{} {sign}{grouped}", Self::CURRENCY_CODE)
    }
}

impl std::str::FromStr for Ugx {
    type Err = UgxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Decimal> for Ugx {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Ugx {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Ugx {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<u32> for Ugx {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Ugx {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Ugx::from_shillings(0).to_string(), "UGX 0");
        assert_eq!(Ugx::from_shillings(999).to_string(), "UGX 999");
        assert_eq!(Ugx::from_shillings(74_000).to_string(), "UGX 74,000");
        assert_eq!(Ugx::from_shillings(1_250_000).to_string(), "UGX 1,250,000");
    }

    #[test]
    fn test_display_rounds_fractions() {
        assert_eq!(Ugx::new(Decimal::new(15_0005, 1)).to_string(), "UGX 15,001");
        assert_eq!(Ugx::new(Decimal::new(15_0004, 1)).to_string(), "UGX 15,000");
    }

    #[test]
    fn test_round_whole_half_away_from_zero() {
        assert_eq!(
            Ugx::new(Decimal::new(25, 1)).round_whole(),
            Ugx::from_shillings(3)
        );
        assert_eq!(
            Ugx::new(Decimal::new(24, 1)).round_whole(),
            Ugx::from_shillings(2)
        );
    }

    #[test]
    fn test_parse_accepts_grouping_and_prefix() {
        assert_eq!(Ugx::parse("100,000").unwrap(), Ugx::from_shillings(100_000));
        assert_eq!(Ugx::parse("UGX 15_000").unwrap(), Ugx::from_shillings(15_000));
        assert_eq!(Ugx::parse(" 2500.5 ").unwrap(), Ugx::new(Decimal::new(25005, 1)));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Ugx::parse("  "), Err(UgxError::Empty));
        assert!(matches!(Ugx::parse("ten"), Err(UgxError::NotANumber(_))));
        assert_eq!(Ugx::parse("-5"), Err(UgxError::Negative));
    }

    #[test]
    fn test_parse_rejects_amounts_near_decimal_limit() {
        assert_eq!(
            Ugx::parse("79228162514264337593543950335"),
            Err(UgxError::TooLarge {
                max: Ugx::MAX_SHILLINGS
            })
        );
        assert!(Ugx::parse("1,000,000,000,000").is_ok());
        assert!(Ugx::parse("1,000,000,000,001").is_err());
    }

    #[test]
    fn test_arithmetic() {
        let line = Ugx::from_shillings(12_500) * 4;
        assert_eq!(line, Ugx::from_shillings(50_000));

        let total: Ugx = [Ugx::from_shillings(1), Ugx::from_shillings(2)]
            .into_iter()
            .sum();
        assert_eq!(total, Ugx::from_shillings(3));
        assert_eq!(total - Ugx::from_shillings(3), Ugx::ZERO);
    }

    #[test]
    fn test_json_number_wire_format() {
        let cost: Ugx = serde_json::from_str("15000").unwrap();
        assert_eq!(cost, Ugx::from_shillings(15_000));

        let json = serde_json::to_value(Ugx::from_shillings(9_000)).unwrap();
        assert_eq!(json.as_f64(), Some(9000.0));
    }
}
