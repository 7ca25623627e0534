//! Custom Test Assertions
//!
//! Assertion helpers for money and dues with messages that show the
//! rendered two-decimal amounts.

use chrono::NaiveDate;
use core_kernel::Money;
use domain_fees::StudentFee;

/// Asserts an amount renders as `expected` (e.g. `"6000.00"`)
pub fn assert_money_eq(actual: Money, expected: &str) {
    assert_eq!(
        actual.format(),
        expected,
        "Money mismatch: actual={}, expected={}",
        actual.format(),
        expected
    );
}

pub fn assert_money_zero(money: Money) {
    assert!(money.is_zero(), "Expected zero, got {}", money.format());
}

/// Asserts the fee has nothing left to pay
pub fn assert_settled(fee: &StudentFee) {
    assert!(
        fee.amount_due().is_zero(),
        "Expected settled fee, {} still due",
        fee.amount_due().format()
    );
    assert!(
        fee.next_due_installment().is_none(),
        "Settled fee should have no next due installment"
    );
}

/// Asserts the outstanding installments as `(due_date, remaining)` pairs
pub fn assert_outstanding(fee: &StudentFee, expected: &[(NaiveDate, Money)]) {
    let actual: Vec<(NaiveDate, Money)> = fee
        .outstanding_installments()
        .iter()
        .map(|o| (o.due_date, o.amount))
        .collect();
    assert_eq!(
        actual, expected,
        "Outstanding installments differ: actual={:?}, expected={:?}",
        actual, expected
    );
}

pub fn assert_next_due(fee: &StudentFee, due_date: NaiveDate, amount: Money) {
    let next = fee
        .next_due_installment()
        .unwrap_or_else(|| panic!("Expected a next due installment on {}", due_date));
    assert_eq!(next.due_date, due_date, "Next due date mismatch");
    assert_eq!(
        next.outstanding_amount,
        amount,
        "Next due amount mismatch: actual={}, expected={}",
        next.outstanding_amount.format(),
        amount.format()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::StudentFeeBuilder;
    use crate::fixtures::{DateFixtures, MoneyFixtures};

    #[test]
    fn test_worked_example_assertions() {
        let fee = StudentFeeBuilder::new().paid(MoneyFixtures::first_payment()).build();
        assert_money_eq(fee.amount_due(), "6000.00");
        assert_next_due(&fee, DateFixtures::jan_1(), Money::from_major(500));
        assert_outstanding(
            &fee,
            &[
                (DateFixtures::jan_1(), Money::from_major(500)),
                (DateFixtures::feb_1(), Money::from_major(3000)),
                (DateFixtures::mar_1(), Money::from_major(2500)),
            ],
        );
    }

    #[test]
    fn test_settled_fee() {
        let fee = StudentFeeBuilder::new().paid(Money::from_major(8500)).build();
        assert_settled(&fee);
        assert_money_zero(fee.amount_due());
    }

    #[test]
    #[should_panic(expected = "Money mismatch")]
    fn test_money_mismatch_panics() {
        assert_money_eq(Money::from_major(1), "2.00");
    }
}
