//! Test Data Builders
//!
//! Builders with sensible defaults so tests only spell out the fields they
//! care about.

use chrono::{NaiveDate, TimeZone, Utc};
use core_kernel::{BatchId, InstituteId, Money, StudentId};
use domain_fees::{
    BatchProfile, DueSchedule, Installment, NewPayment, Payment, PaymentMode, StudentFee, StudentProfile,
};
use domain_reminders::{NewReminderRule, ReminderRule, RuleParams};

use crate::fixtures::{DateFixtures, MoneyFixtures, ScheduleFixtures};

/// Builder for a student fee with its payments
#[derive(Debug, Clone)]
pub struct StudentFeeBuilder {
    institute_id: InstituteId,
    student_id: StudentId,
    batch_id: BatchId,
    total_fee: Money,
    discount: Money,
    schedule: DueSchedule,
    payments: Vec<(Money, NaiveDate)>,
}

impl Default for StudentFeeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StudentFeeBuilder {
    /// 9000 total, 500 discount, three installments, no payments
    pub fn new() -> Self {
        Self {
            institute_id: InstituteId::new(),
            student_id: StudentId::new(),
            batch_id: BatchId::new(),
            total_fee: MoneyFixtures::course_fee(),
            discount: MoneyFixtures::scholarship(),
            schedule: ScheduleFixtures::three_installments(),
            payments: Vec::new(),
        }
    }

    pub fn institute(mut self, id: InstituteId) -> Self {
        self.institute_id = id;
        self
    }

    pub fn student(mut self, id: StudentId) -> Self {
        self.student_id = id;
        self
    }

    pub fn batch(mut self, id: BatchId) -> Self {
        self.batch_id = id;
        self
    }

    pub fn total_fee(mut self, amount: Money) -> Self {
        self.total_fee = amount;
        self
    }

    pub fn discount(mut self, amount: Money) -> Self {
        self.discount = amount;
        self
    }

    pub fn schedule(mut self, schedule: DueSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn installment(mut self, due_date: NaiveDate, amount: Money) -> Self {
        let mut installments = self.schedule.installments().to_vec();
        installments.push(Installment::new(due_date, amount));
        self.schedule = DueSchedule::new(installments);
        self
    }

    pub fn without_schedule(mut self) -> Self {
        self.schedule = DueSchedule::empty();
        self
    }

    pub fn paid(mut self, amount: Money) -> Self {
        self.payments.push((amount, DateFixtures::jan_1()));
        self
    }

    pub fn build(self) -> StudentFee {
        let created_at = Utc.with_ymd_and_hms(2023, 12, 15, 10, 0, 0).unwrap();
        let mut fee = StudentFee {
            id: Default::default(),
            institute_id: self.institute_id,
            student_id: self.student_id,
            batch_id: self.batch_id,
            fee_plan_id: None,
            total_fee: self.total_fee,
            discount: self.discount,
            due_schedule: self.schedule,
            payments: Vec::new(),
            created_at,
        };
        fee.payments = self
            .payments
            .into_iter()
            .map(|(amount, paid_on)| PaymentBuilder::for_fee(&fee).amount(amount).paid_on(paid_on).build())
            .collect();
        fee
    }
}

/// Builder for a recorded payment
#[derive(Debug, Clone)]
pub struct PaymentBuilder {
    payment: NewPayment,
}

impl PaymentBuilder {
    pub fn for_fee(fee: &StudentFee) -> Self {
        Self {
            payment: NewPayment {
                institute_id: fee.institute_id,
                student_fee_id: fee.id,
                amount: MoneyFixtures::first_payment(),
                paid_on: DateFixtures::jan_1(),
                mode: PaymentMode::Cash,
                remarks: None,
                created_by: None,
            },
        }
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.payment.amount = amount;
        self
    }

    pub fn paid_on(mut self, date: NaiveDate) -> Self {
        self.payment.paid_on = date;
        self
    }

    pub fn mode(mut self, mode: PaymentMode) -> Self {
        self.payment.mode = mode;
        self
    }

    pub fn build(self) -> Payment {
        self.payment.into_payment(Utc::now())
    }
}

/// Builder for a reminder rule
#[derive(Debug, Clone)]
pub struct ReminderRuleBuilder {
    rule: NewReminderRule,
}

impl ReminderRuleBuilder {
    /// Active institute-wide rule: 3 days before, on the due date, every 3 days after
    pub fn new(institute_id: InstituteId) -> Self {
        Self {
            rule: NewReminderRule {
                institute_id,
                batch_id: None,
                name: "Standard reminders".to_string(),
                params: RuleParams {
                    days_before: 3,
                    on_due_date: true,
                    every_n_days_after_due: 3,
                },
                is_active: true,
            },
        }
    }

    pub fn batch(mut self, batch_id: BatchId) -> Self {
        self.rule.batch_id = Some(batch_id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.rule.name = name.into();
        self
    }

    pub fn days_before(mut self, days: u32) -> Self {
        self.rule.params.days_before = days;
        self
    }

    pub fn on_due_date(mut self, on: bool) -> Self {
        self.rule.params.on_due_date = on;
        self
    }

    pub fn every_n_days_after_due(mut self, days: u32) -> Self {
        self.rule.params.every_n_days_after_due = days;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.rule.is_active = false;
        self
    }

    pub fn new_rule(self) -> NewReminderRule {
        self.rule
    }

    pub fn build(self) -> ReminderRule {
        self.rule.into_rule(Utc::now())
    }
}

pub fn student_profile(institute_id: InstituteId, full_name: &str) -> StudentProfile {
    StudentProfile {
        id: StudentId::new(),
        institute_id,
        user_id: None,
        full_name: full_name.to_string(),
        email: None,
    }
}

pub fn batch_profile(institute_id: InstituteId, name: &str) -> BatchProfile {
    BatchProfile {
        id: BatchId::new(),
        institute_id,
        name: name.to_string(),
        course: None,
    }
}
