//! Due-schedule resolution
//!
//! `FeeLedger` answers the questions every reader of a student fee asks:
//! how much has been paid, how much is still owed, which installments are
//! outstanding and which one is due next. It is a pure view over the fee
//! data and never mutates anything.

use chrono::NaiveDate;
use serde::Serialize;

use core_kernel::Money;

use crate::schedule::{DueSchedule, Installment};

/// An installment with part or all of its amount unpaid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutstandingInstallment {
    /// 0-based position in the schedule sorted by due date
    pub index: usize,
    pub due_date: NaiveDate,
    /// Unpaid part of the installment
    pub amount: Money,
}

/// The earliest installment that is not fully paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextDue {
    pub due_date: NaiveDate,
    pub outstanding_amount: Money,
}

/// Read-only resolver over one student fee
#[derive(Debug, Clone)]
pub struct FeeLedger<'a> {
    total_fee: Money,
    discount: Money,
    schedule: &'a DueSchedule,
    paid: Money,
}

impl<'a> FeeLedger<'a> {
    /// Creates a ledger view
    ///
    /// Payments may be given in any order; only their sum matters.
    pub fn new<I>(total_fee: Money, discount: Money, schedule: &'a DueSchedule, payments: I) -> Self
    where
        I: IntoIterator<Item = Money>,
    {
        Self {
            total_fee,
            discount,
            schedule,
            paid: Money::total(payments),
        }
    }

    /// `max(total_fee - discount, 0)`
    pub fn total_due(&self) -> Money {
        (self.total_fee - self.discount).clamp_non_negative()
    }

    /// Sum of all payments
    pub fn amount_paid(&self) -> Money {
        self.paid
    }

    /// `max(total_due - amount_paid, 0)`
    pub fn amount_due(&self) -> Money {
        self.total_due().saturating_sub(self.paid)
    }

    /// Returns true once nothing is owed
    pub fn is_settled(&self) -> bool {
        !self.amount_due().is_positive()
    }

    /// Applies payments to the sorted schedule and returns what is left
    ///
    /// Payments beyond the schedule total are left unconsumed. A negative
    /// installment returns its amount to the payment pool for later ones.
    pub fn outstanding_installments(&self) -> Vec<OutstandingInstallment> {
        self.waterfall().collect()
    }

    /// First outstanding installment, or `None` when the schedule is empty
    /// or fully covered by payments
    pub fn next_due_installment(&self) -> Option<NextDue> {
        self.waterfall().next().map(|o| NextDue {
            due_date: o.due_date,
            outstanding_amount: o.amount,
        })
    }

    fn waterfall(&self) -> impl Iterator<Item = OutstandingInstallment> {
        let mut pool = self.paid.clamp_non_negative();
        self.schedule
            .sorted()
            .into_iter()
            .enumerate()
            .filter_map(move |(index, Installment { due_date, amount })| {
                let consumed = pool.min(amount);
                pool -= consumed;
                let outstanding = amount - consumed;
                outstanding.is_positive().then_some(OutstandingInstallment {
                    index,
                    due_date,
                    amount: outstanding,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rupees(n: i64) -> Money {
        Money::from_major(n)
    }

    fn schedule(items: &[(NaiveDate, i64)]) -> DueSchedule {
        DueSchedule::new(items.iter().map(|(d, a)| Installment::new(*d, rupees(*a))).collect())
    }

    #[test]
    fn test_partial_payment_waterfall() {
        let s = schedule(&[(date(2024, 1, 1), 100), (date(2024, 2, 1), 50)]);
        let ledger = FeeLedger::new(rupees(150), Money::ZERO, &s, [rupees(120)]);
        assert_eq!(
            ledger.outstanding_installments(),
            vec![OutstandingInstallment { index: 1, due_date: date(2024, 2, 1), amount: rupees(30) }]
        );
    }

    #[test]
    fn test_discounted_fee_example() {
        let s = schedule(&[
            (date(2024, 1, 1), 3000),
            (date(2024, 2, 1), 3000),
            (date(2024, 3, 1), 2500),
        ]);
        let ledger = FeeLedger::new(rupees(9000), rupees(500), &s, [rupees(2500)]);
        assert_eq!(ledger.total_due(), rupees(8500));
        assert_eq!(ledger.amount_due(), rupees(6000));
        assert_eq!(
            ledger.next_due_installment(),
            Some(NextDue { due_date: date(2024, 1, 1), outstanding_amount: rupees(500) })
        );
    }

    #[test]
    fn test_unsorted_schedule_is_sorted_before_applying() {
        let s = schedule(&[(date(2024, 3, 1), 100), (date(2024, 1, 1), 100)]);
        let ledger = FeeLedger::new(rupees(200), Money::ZERO, &s, [rupees(100)]);
        let outstanding = ledger.outstanding_installments();
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].index, 1);
        assert_eq!(outstanding[0].due_date, date(2024, 3, 1));
    }

    #[test]
    fn test_empty_schedule_still_owes() {
        let s = DueSchedule::empty();
        let ledger = FeeLedger::new(rupees(1000), Money::ZERO, &s, []);
        assert_eq!(ledger.amount_due(), rupees(1000));
        assert!(ledger.next_due_installment().is_none());
        assert!(ledger.outstanding_installments().is_empty());
    }

    #[test]
    fn test_overpayment_is_not_credited() {
        let s = schedule(&[(date(2024, 1, 1), 100)]);
        let ledger = FeeLedger::new(rupees(100), Money::ZERO, &s, [rupees(80), rupees(70)]);
        assert_eq!(ledger.amount_paid(), rupees(150));
        assert_eq!(ledger.amount_due(), Money::ZERO);
        assert!(ledger.is_settled());
        assert!(ledger.next_due_installment().is_none());
    }

    #[test]
    fn test_discount_above_total_clamps_to_zero() {
        let s = DueSchedule::empty();
        let ledger = FeeLedger::new(rupees(100), rupees(150), &s, []);
        assert_eq!(ledger.total_due(), Money::ZERO);
        assert!(ledger.is_settled());
    }

    #[test]
    fn test_negative_installment_feeds_pool() {
        let s = schedule(&[(date(2024, 1, 1), -50), (date(2024, 2, 1), 100)]);
        let ledger = FeeLedger::new(rupees(100), Money::ZERO, &s, [rupees(40)]);
        assert_eq!(
            ledger.outstanding_installments(),
            vec![OutstandingInstallment { index: 1, due_date: date(2024, 2, 1), amount: rupees(10) }]
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_schedule() -> impl Strategy<Value = DueSchedule> {
        proptest::collection::vec((0i64..365, 1i64..1_000_000), 0..8).prop_map(|items| {
            let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            DueSchedule::new(
                items
                    .into_iter()
                    .map(|(offset, paise)| {
                        Installment::new(base + chrono::Duration::days(offset), Money::from_minor(paise))
                    })
                    .collect(),
            )
        })
    }

    proptest! {
        #[test]
        fn amount_due_is_never_negative(
            total in 0i64..10_000_000,
            discount in 0i64..10_000_000,
            payments in proptest::collection::vec(0i64..5_000_000, 0..5),
        ) {
            let schedule = DueSchedule::empty();
            let ledger = FeeLedger::new(
                Money::from_minor(total),
                Money::from_minor(discount),
                &schedule,
                payments.iter().map(|p| Money::from_minor(*p)),
            );
            let expected = (Money::from_minor(total) - Money::from_minor(discount)
                - Money::total(payments.iter().map(|p| Money::from_minor(*p))))
                .clamp_non_negative();
            prop_assert_eq!(ledger.amount_due(), expected);
            prop_assert!(!ledger.amount_due().is_negative());
        }

        #[test]
        fn unpaid_schedule_is_fully_outstanding(schedule in arb_schedule()) {
            let ledger = FeeLedger::new(schedule.total(), Money::ZERO, &schedule, []);
            let outstanding = ledger.outstanding_installments();
            let sorted = schedule.sorted();
            prop_assert_eq!(outstanding.len(), sorted.len());
            for (o, i) in outstanding.iter().zip(sorted.iter()) {
                prop_assert_eq!(o.amount, i.amount);
                prop_assert_eq!(o.due_date, i.due_date);
            }
            if let Some(first) = sorted.first() {
                prop_assert_eq!(ledger.next_due_installment().map(|n| n.due_date), Some(first.due_date));
            }
        }

        #[test]
        fn full_payment_clears_schedule(schedule in arb_schedule(), extra in 0i64..100_000) {
            let paid = schedule.total() + Money::from_minor(extra);
            let ledger = FeeLedger::new(schedule.total(), Money::ZERO, &schedule, [paid]);
            prop_assert!(ledger.outstanding_installments().is_empty());
            prop_assert!(ledger.next_due_installment().is_none());
        }

        #[test]
        fn outstanding_plus_paid_covers_schedule(schedule in arb_schedule(), paid in 0i64..3_000_000) {
            let paid = Money::from_minor(paid);
            let ledger = FeeLedger::new(schedule.total(), Money::ZERO, &schedule, [paid]);
            let outstanding: Money = ledger.outstanding_installments().iter().map(|o| o.amount).sum();
            prop_assert_eq!(outstanding, schedule.total().saturating_sub(paid));
        }
    }
}
