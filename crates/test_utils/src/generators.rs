//! Property-Based Test Generators
//!
//! Proptest strategies for amounts, schedules and payment lists.

use chrono::{Duration, NaiveDate};
use core_kernel::Money;
use domain_fees::{DueSchedule, Installment};
use proptest::prelude::*;

/// Amounts from 0.00 up to 1,00,000.00 in paise
pub fn money_strategy() -> impl Strategy<Value = Money> {
    (0i64..10_000_000i64).prop_map(Money::from_minor)
}

/// Amounts from 0.01 up to 1,00,000.00
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (1i64..10_000_000i64).prop_map(Money::from_minor)
}

/// Dates within 2024
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..366).prop_map(|offset| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset))
}

pub fn installment_strategy() -> impl Strategy<Value = Installment> {
    (date_strategy(), positive_money_strategy()).prop_map(|(due_date, amount)| Installment::new(due_date, amount))
}

/// Unsorted schedules of 1 to 6 installments
pub fn schedule_strategy() -> impl Strategy<Value = DueSchedule> {
    prop::collection::vec(installment_strategy(), 1..=6).prop_map(DueSchedule::new)
}

/// Zero to five payment amounts
pub fn payments_strategy() -> impl Strategy<Value = Vec<Money>> {
    prop::collection::vec(positive_money_strategy(), 0..=5)
}

/// A `(total_fee, discount)` pair with `discount <= total_fee`
pub fn fee_terms_strategy() -> impl Strategy<Value = (Money, Money)> {
    (0i64..10_000_000i64)
        .prop_flat_map(|total| (Just(total), 0i64..=total))
        .prop_map(|(total, discount)| (Money::from_minor(total), Money::from_minor(discount)))
}
