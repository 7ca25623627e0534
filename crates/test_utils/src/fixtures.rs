//! Pre-built Test Fixtures
//!
//! Dates and amounts from the worked examples used throughout the suite.

use chrono::NaiveDate;
use core_kernel::Money;
use domain_fees::{DueSchedule, Installment};
use rust_decimal_macros::dec;

/// Calendar fixtures, all in early 2024
pub struct DateFixtures;

impl DateFixtures {
    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn jan_1() -> NaiveDate {
        Self::date(2024, 1, 1)
    }

    pub fn feb_1() -> NaiveDate {
        Self::date(2024, 2, 1)
    }

    pub fn mar_1() -> NaiveDate {
        Self::date(2024, 3, 1)
    }

    /// Three days before `feb_1`
    pub fn reminder_run_date() -> NaiveDate {
        Self::date(2024, 1, 29)
    }
}

/// Amount fixtures in rupees
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn inr(major: i64) -> Money {
        Money::from_major(major)
    }

    pub fn course_fee() -> Money {
        Money::from_major(9000)
    }

    pub fn scholarship() -> Money {
        Money::from_major(500)
    }

    pub fn first_payment() -> Money {
        Money::from_major(2500)
    }

    /// A fractional amount that must render with two decimals
    pub fn odd_amount() -> Money {
        Money::new(dec!(1234.5))
    }
}

/// Schedule fixtures
pub struct ScheduleFixtures;

impl ScheduleFixtures {
    /// 3000 on Jan 1, 3000 on Feb 1, 2500 on Mar 1
    pub fn three_installments() -> DueSchedule {
        DueSchedule::new(vec![
            Installment::new(DateFixtures::jan_1(), Money::from_major(3000)),
            Installment::new(DateFixtures::feb_1(), Money::from_major(3000)),
            Installment::new(DateFixtures::mar_1(), Money::from_major(2500)),
        ])
    }

    /// 100 on Jan 1 and 50 on Feb 1
    pub fn two_small() -> DueSchedule {
        DueSchedule::new(vec![
            Installment::new(DateFixtures::jan_1(), Money::from_major(100)),
            Installment::new(DateFixtures::feb_1(), Money::from_major(50)),
        ])
    }

    pub fn single(due_date: NaiveDate, amount: Money) -> DueSchedule {
        DueSchedule::new(vec![Installment::new(due_date, amount)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_installments_total() {
        assert_eq!(ScheduleFixtures::three_installments().total(), Money::from_major(8500));
    }

    #[test]
    fn test_run_date_is_three_days_before_feb() {
        assert_eq!((DateFixtures::feb_1() - DateFixtures::reminder_run_date()).num_days(), 3);
    }
}
