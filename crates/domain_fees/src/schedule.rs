//! Installment schedules
//!
//! Schedules are persisted as JSON arrays of `{due_date, amount}` objects.
//! Stored data is not trusted: amounts may be numbers or strings and whole
//! documents may be malformed. Parsing never fails; anything unusable is
//! dropped so that dues can always be computed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use core_kernel::{format_iso_date, parse_iso_date, Money};

use crate::error::FeeError;

/// A single installment of a student fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// Calendar date the installment is due
    pub due_date: NaiveDate,
    /// Installment amount
    pub amount: Money,
}

impl Installment {
    pub fn new(due_date: NaiveDate, amount: Money) -> Self {
        Self { due_date, amount }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let raw_date = value.get("due_date")?.as_str()?;
        let due_date = parse_iso_date(raw_date).ok()?;
        Some(Self {
            due_date,
            amount: Money::coerce_opt(value.get("amount")),
        })
    }
}

/// Installments of a student fee in insertion order
///
/// Entries need not be sorted. Use [`DueSchedule::sorted`] for the order in
/// which payments are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DueSchedule(Vec<Installment>);

impl DueSchedule {
    pub fn new(installments: Vec<Installment>) -> Self {
        Self(installments)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a stored schedule document
    ///
    /// A non-array document yields an empty schedule. Entries without a
    /// valid ISO `due_date` are dropped; amounts are coerced.
    pub fn from_json(value: &Value) -> Self {
        let Some(entries) = value.as_array() else {
            debug!("due schedule is not an array, treating as empty");
            return Self::empty();
        };

        let installments: Vec<Installment> = entries.iter().filter_map(Installment::from_value).collect();
        if installments.len() != entries.len() {
            debug!(
                dropped = entries.len() - installments.len(),
                "dropped schedule entries with invalid due dates"
            );
        }
        Self(installments)
    }

    /// Parses a stored schedule from its serialized text
    pub fn from_json_str(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_json(&value),
            Err(_) => Self::empty(),
        }
    }

    /// Stored representation with string amounts
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|i| json!({ "due_date": format_iso_date(i.due_date), "amount": i.amount.format() }))
                .collect(),
        )
    }

    /// Installments stably sorted by due date
    ///
    /// Installments sharing a due date keep their stored order.
    pub fn sorted(&self) -> Vec<Installment> {
        let mut sorted = self.0.clone();
        sorted.sort_by_key(|i| i.due_date);
        sorted
    }

    /// Sum of all installment amounts
    pub fn total(&self) -> Money {
        self.0.iter().map(|i| i.amount).sum()
    }

    pub fn installments(&self) -> &[Installment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks a schedule submitted for a new fee
    ///
    /// New schedules must have at least one installment and every amount
    /// must be positive. Stored schedules are never re-validated.
    pub fn validate_for_creation(&self) -> Result<(), FeeError> {
        if self.is_empty() {
            return Err(FeeError::InvalidSchedule(
                "schedule must contain at least one installment".to_string(),
            ));
        }
        if let Some(bad) = self.0.iter().find(|i| !i.amount.is_positive()) {
            return Err(FeeError::InvalidSchedule(format!(
                "installment due {} must have a positive amount",
                format_iso_date(bad.due_date)
            )));
        }
        Ok(())
    }
}

impl From<Vec<Installment>> for DueSchedule {
    fn from(installments: Vec<Installment>) -> Self {
        Self(installments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_json_mixed_amounts() {
        let schedule = DueSchedule::from_json(&json!([
            {"due_date": "2024-02-01", "amount": "3000"},
            {"due_date": "2024-01-01", "amount": 2500.5},
        ]));
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule.total().amount(), dec!(5500.5));
    }

    #[test]
    fn test_from_json_drops_bad_dates() {
        let schedule = DueSchedule::from_json(&json!([
            {"due_date": "2024-02-01", "amount": 100},
            {"due_date": "next week", "amount": 100},
            {"amount": 100},
            "garbage",
        ]));
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn test_non_array_is_empty() {
        assert!(DueSchedule::from_json(&json!({"due_date": "2024-01-01"})).is_empty());
        assert!(DueSchedule::from_json(&Value::Null).is_empty());
        assert!(DueSchedule::from_json_str("{not json").is_empty());
    }

    #[test]
    fn test_sorted_is_stable() {
        let d = date(2024, 1, 1);
        let schedule = DueSchedule::new(vec![
            Installment::new(date(2024, 2, 1), Money::from_major(1)),
            Installment::new(d, Money::from_major(2)),
            Installment::new(d, Money::from_major(3)),
        ]);
        let sorted = schedule.sorted();
        assert_eq!(sorted[0].amount, Money::from_major(2));
        assert_eq!(sorted[1].amount, Money::from_major(3));
        assert_eq!(sorted[2].due_date, date(2024, 2, 1));
    }

    #[test]
    fn test_to_json_round_trips() {
        let schedule = DueSchedule::new(vec![Installment::new(date(2024, 3, 1), Money::from_major(2500))]);
        let stored = schedule.to_json();
        assert_eq!(stored, json!([{"due_date": "2024-03-01", "amount": "2500.00"}]));
        assert_eq!(DueSchedule::from_json(&stored), schedule);
    }

    #[test]
    fn test_validate_for_creation() {
        assert!(DueSchedule::empty().validate_for_creation().is_err());
        let zero = DueSchedule::new(vec![Installment::new(date(2024, 3, 1), Money::ZERO)]);
        assert!(matches!(zero.validate_for_creation(), Err(FeeError::InvalidSchedule(_))));
        let ok = DueSchedule::new(vec![Installment::new(date(2024, 3, 1), Money::from_major(1))]);
        assert!(ok.validate_for_creation().is_ok());
    }
}
