//! Type-safe product price using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a number like 9.99")]
    Invalid,
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount does not fit the `NUMERIC(10, 2)` column.
    #[error("price must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A non-negative price in the store currency, kept to two decimal places.
///
/// Serialized as a decimal string (`"9.99"`). Deserialization accepts either
/// a JSON number or a string.
///
/// ```
/// use shopfront_core::Price;
///
/// let price = Price::parse("19.999").unwrap();
/// assert_eq!(price.to_string(), "$20.00");
/// assert!(Price::parse("-1").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Exclusive upper bound, matching the `NUMERIC(10, 2)` column.
    pub const MAX: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 2);

    /// Create a price from a decimal amount, rounding half away from zero to
    /// cents.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` or `PriceError::TooLarge` when the
    /// rounded amount is out of range.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        let mut amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(2);
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount >= Self::MAX {
            return Err(PriceError::TooLarge { max: Self::MAX });
        }
        Ok(Self(if amount.is_zero() { Decimal::new(0, 2) } else { amount }))
    }

    /// Parse a price from user input such as `"9.99"` or `"$9.99"`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Invalid` if the input is not a decimal number,
    /// otherwise the errors of [`Price::new`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
        let amount = Decimal::from_str(digits).map_err(|_| PriceError::Invalid)?;
        Self::new(amount)
    }

    /// The amount as a decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_max_is_one_hundred_million() {
        assert_eq!(Price::MAX, Decimal::from(100_000_000));
    }

    #[test]
    fn test_parse_rounds_to_cents() {
        assert_eq!(Price::parse("2.005").unwrap().amount(), Decimal::new(201, 2));
        assert_eq!(Price::parse("2.004").unwrap().amount(), Decimal::new(200, 2));
    }

    #[test]
    fn test_parse_accepts_dollar_sign() {
        assert_eq!(Price::parse(" $4.50 ").unwrap().amount(), Decimal::new(450, 2));
    }

    #[test]
    fn test_parse_rejects_non_numbers() {
        assert_eq!(Price::parse("free"), Err(PriceError::Invalid));
        assert_eq!(Price::parse(""), Err(PriceError::Invalid));
    }

    #[test]
    fn test_negative_and_too_large() {
        assert_eq!(Price::parse("-0.01"), Err(PriceError::Negative));
        assert!(matches!(
            Price::parse("100000000"),
            Err(PriceError::TooLarge { .. })
        ));
        assert!(Price::parse("99999999.99").is_ok());
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let price = Price::parse("-0.001").unwrap();
        assert!(price.amount().is_zero());
        assert_eq!(price.to_string(), "$0.00");
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::parse("3").unwrap().to_string(), "$3.00");
    }

    #[test]
    fn test_json_accepts_number_or_string() {
        let from_number: Price = serde_json::from_str("12.5").unwrap();
        let from_string: Price = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "\"12.50\"");
    }

    #[test]
    fn test_json_rejects_negative() {
        let parsed: Result<Price, _> = serde_json::from_str("\"-3\"");
        assert!(parsed.is_err());
    }
}
