//! Catalog price type.
//!
//! Prices are optional on a bag and arrive from the admin form as free text.
//! Parsing and display live here so the actions and the view compositors
//! share one definition of "a valid price".

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`Price`] from form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a valid number.
    #[error("price must be a valid number")]
    NotANumber,
    /// The input is negative.
    #[error("price cannot be negative")]
    Negative,
}

/// A catalog price in KES.
///
/// Wraps [`Decimal`] so form parsing does not go through floating point.
/// Serializes as a JSON number because that is what the catalog store holds
/// in its `pricing` column; deserialization also accepts strings since the
/// store echoes numerics back as either depending on precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Price(Decimal);

impl Price {
    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Parse an optional price from a trimmed form field.
    ///
    /// An empty field means "no price" and is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] when a non-empty field is not a valid
    /// non-negative number.
    pub fn parse_form_value(raw: &str) -> Result<Option<Self>, PriceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let amount = Decimal::from_str(trimmed).map_err(|_| PriceError::NotANumber)?;
        if amount.is_sign_negative() {
            return Err(PriceError::Negative);
        }
        Ok(Some(Self(amount)))
    }

    /// Format for display: `KES 1,250` (whole shillings, thousands grouped).
    #[must_use]
    pub fn display_kes(&self) -> String {
        let whole = self.0.round().to_i128().unwrap_or(0);
        format!("KES {}", group_thousands(whole))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_kes())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // The store's pricing column is numeric; send a JSON number.
        match self.0.to_f64() {
            Some(amount) => serializer.serialize_f64(amount),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let amount = match &value {
            serde_json::Value::Number(n) => {
                Decimal::from_str(&n.to_string()).map_err(D::Error::custom)?
            }
            serde_json::Value::String(s) => Decimal::from_str(s).map_err(D::Error::custom)?,
            other => {
                return Err(D::Error::custom(format!(
                    "expected number or string for price, got {other}"
                )));
            }
        };
        Ok(Self(amount))
    }
}

/// Insert `,` separators into a non-negative whole amount.
fn group_thousands(mut value: i128) -> String {
    let negative = value < 0;
    value = value.abs();
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_is_no_price() {
        assert_eq!(Price::parse_form_value(""), Ok(None));
        assert_eq!(Price::parse_form_value("   "), Ok(None));
    }

    #[test]
    fn test_parse_valid_numbers() {
        let price = Price::parse_form_value("1250").unwrap().unwrap();
        assert_eq!(price.amount(), Decimal::from_str("1250").unwrap());

        let price = Price::parse_form_value(" 99.50 ").unwrap().unwrap();
        assert_eq!(price.amount(), Decimal::from_str("99.50").unwrap());
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert_eq!(Price::parse_form_value("abc"), Err(PriceError::NotANumber));
        assert_eq!(
            Price::parse_form_value("12a50"),
            Err(PriceError::NotANumber)
        );
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert_eq!(Price::parse_form_value("-5"), Err(PriceError::Negative));
    }

    #[test]
    fn test_display_groups_thousands() {
        let price = Price::parse_form_value("1250").unwrap().unwrap();
        assert_eq!(price.display_kes(), "KES 1,250");

        let price = Price::parse_form_value("1234567").unwrap().unwrap();
        assert_eq!(price.display_kes(), "KES 1,234,567");

        let price = Price::parse_form_value("999").unwrap().unwrap();
        assert_eq!(price.display_kes(), "KES 999");
    }

    #[test]
    fn test_display_rounds_to_whole_shillings() {
        let price = Price::parse_form_value("1250.60").unwrap().unwrap();
        assert_eq!(price.display_kes(), "KES 1,251");
    }

    #[test]
    fn test_serializes_as_json_number() {
        let price = Price::parse_form_value("1250").unwrap().unwrap();
        assert_eq!(serde_json::to_value(price).unwrap(), serde_json::json!(1250.0));
    }

    #[test]
    fn test_deserializes_from_number_or_string() {
        let from_number: Price = serde_json::from_value(serde_json::json!(1250)).unwrap();
        let from_string: Price = serde_json::from_value(serde_json::json!("1250")).unwrap();
        assert_eq!(from_number, from_string);
    }
}
