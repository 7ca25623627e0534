//! Money types with precise decimal arithmetic
//!
//! Fee amounts are persisted inconsistently: numeric columns, JSON numbers,
//! and JSON strings all occur in the same records. This module provides a
//! single `Money` type backed by `rust_decimal` with a lenient coercion path
//! so that every reader computes dues from the same normalized values.
//!
//! Coercion never fails. Anything that is not a finite number becomes zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// ISO 4217 code used when rendering amounts for people
pub const CURRENCY_CODE: &str = "INR";

/// Number of decimal places kept internally
const INTERNAL_DP: u32 = 4;

/// Number of decimal places used for display
const DISPLAY_DP: u32 = 2;

/// A monetary amount in the institute's currency
///
/// Amounts are stored with 4 decimal places internally and rendered with
/// exactly 2. Negative values are representable; callers that need a
/// non-negative balance clamp explicitly with [`Money::clamp_non_negative`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates a new Money value
    pub fn new(amount: Decimal) -> Self {
        Money(amount.round_dp(INTERNAL_DP))
    }

    /// Creates Money from an integer amount in minor units (paise)
    pub fn from_minor(minor_units: i64) -> Self {
        Self::new(Decimal::new(minor_units, DISPLAY_DP))
    }

    /// Creates Money from whole rupees
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// Creates a zero amount
    pub fn zero() -> Self {
        Self::ZERO
    }

    /// Coerces a stored JSON value into Money
    ///
    /// Numbers and numeric strings convert. `null`, booleans, arrays,
    /// objects, non-numeric strings and non-finite values become zero.
    pub fn coerce(value: &Value) -> Self {
        match value {
            Value::Number(n) => Self::parse_lenient(&n.to_string()),
            Value::String(s) => Self::parse_lenient(s),
            _ => Self::ZERO,
        }
    }

    /// Coerces an optional stored JSON value, treating a missing value as zero
    pub fn coerce_opt(value: Option<&Value>) -> Self {
        value.map(Self::coerce).unwrap_or(Self::ZERO)
    }

    /// Parses a raw string leniently
    ///
    /// Accepts plain (`"1250.50"`) and scientific (`"1.2505e3"`) notation
    /// with surrounding whitespace. Everything else is zero.
    pub fn parse_lenient(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::ZERO;
        }
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Self::new)
            .unwrap_or(Self::ZERO)
    }

    /// Sums a sequence of amounts
    ///
    /// Entries are expected to be coerced already, so invalid inputs
    /// contribute zero instead of being dropped.
    pub fn total<I>(amounts: I) -> Self
    where
        I: IntoIterator<Item = Money>,
    {
        amounts.into_iter().fold(Self::ZERO, |acc, m| acc + m)
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns `max(self, 0)`
    pub fn clamp_non_negative(self) -> Self {
        if self.is_negative() {
            Self::ZERO
        } else {
            self
        }
    }

    /// Subtracts and clamps the result at zero
    pub fn saturating_sub(self, other: Money) -> Self {
        (self - other).clamp_non_negative()
    }

    /// Formats the amount with exactly two decimal digits, e.g. `"1234.50"`
    pub fn format(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(DISPLAY_DP, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.2}", rounded)
    }

    /// Formats the amount prefixed with the currency code, e.g. `"INR 1234.50"`
    pub fn format_with_code(&self) -> String {
        format!("{} {}", CURRENCY_CODE, self.format())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Decimal {
        money.0
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Money::new(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Money::new(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money::total(iter)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        Money::total(iter.copied())
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Money::coerce(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_coerce_number_and_string() {
        assert_eq!(Money::coerce(&json!(3000)).amount(), dec!(3000));
        assert_eq!(Money::coerce(&json!("2500.75")).amount(), dec!(2500.75));
        assert_eq!(Money::coerce(&json!(12.5)).amount(), dec!(12.5));
    }

    #[test]
    fn test_coerce_invalid_is_zero() {
        assert!(Money::coerce(&json!(null)).is_zero());
        assert!(Money::coerce(&json!("abc")).is_zero());
        assert!(Money::coerce(&json!("NaN")).is_zero());
        assert!(Money::coerce(&json!("Infinity")).is_zero());
        assert!(Money::coerce(&json!(true)).is_zero());
        assert!(Money::coerce(&json!({"amount": 5})).is_zero());
        assert!(Money::coerce_opt(None).is_zero());
    }

    #[test]
    fn test_format_two_decimals() {
        assert_eq!(Money::from_major(500).format(), "500.00");
        assert_eq!(Money::new(dec!(0.125)).format(), "0.13");
        assert_eq!(Money::new(dec!(99.9)).format(), "99.90");
        assert_eq!(Money::ZERO.format(), "0.00");
        assert_eq!(Money::from_major(6000).format_with_code(), "INR 6000.00");
    }

    #[test]
    fn test_saturating_sub() {
        let a = Money::from_major(100);
        let b = Money::from_major(150);
        assert_eq!(a.saturating_sub(b), Money::ZERO);
        assert_eq!(b.saturating_sub(a), Money::from_major(50));
    }

    #[test]
    fn test_serde_round_trip_is_lenient() {
        let parsed: Vec<Money> = serde_json::from_str(r#"[100, "50.5", null, "x"]"#).unwrap();
        assert_eq!(Money::total(parsed.clone()), Money::new(dec!(150.5)));
        assert_eq!(parsed.len(), 4);

        let encoded = serde_json::to_string(&Money::new(dec!(7.1))).unwrap();
        assert_eq!(encoded, "\"7.10\"");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn string_and_number_forms_agree(minor in 0i64..100_000_000i64) {
            let money = Money::from_minor(minor);
            let from_str = Money::parse_lenient(&money.format());
            prop_assert_eq!(from_str, money);
        }

        #[test]
        fn sum_is_order_independent(values in proptest::collection::vec(-1_000_000i64..1_000_000i64, 0..20)) {
            let forward = Money::total(values.iter().map(|v| Money::from_minor(*v)));
            let backward = Money::total(values.iter().rev().map(|v| Money::from_minor(*v)));
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn clamp_is_never_negative(minor in -1_000_000i64..1_000_000i64) {
            prop_assert!(!Money::from_minor(minor).clamp_non_negative().is_negative());
        }
    }
}
