//! Student fee records
//!
//! A `StudentFee` binds one student in one batch to a fee total, a discount
//! and an installment schedule. Each student and batch pair has at most one
//! fee record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BatchId, FeePlanId, InstituteId, Money, StudentFeeId, StudentId};

use crate::error::FeeError;
use crate::ledger::{FeeLedger, NextDue, OutstandingInstallment};
use crate::payment::Payment;
use crate::schedule::DueSchedule;

/// A fee record with the payments recorded against it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFee {
    pub id: StudentFeeId,
    pub institute_id: InstituteId,
    pub student_id: StudentId,
    pub batch_id: BatchId,
    pub fee_plan_id: Option<FeePlanId>,
    pub total_fee: Money,
    pub discount: Money,
    pub due_schedule: DueSchedule,
    pub payments: Vec<Payment>,
    pub created_at: DateTime<Utc>,
}

impl StudentFee {
    /// Resolver view over this record
    pub fn ledger(&self) -> FeeLedger<'_> {
        FeeLedger::new(
            self.total_fee,
            self.discount,
            &self.due_schedule,
            self.payments.iter().map(|p| p.amount),
        )
    }

    pub fn amount_paid(&self) -> Money {
        self.ledger().amount_paid()
    }

    pub fn amount_due(&self) -> Money {
        self.ledger().amount_due()
    }

    pub fn outstanding_installments(&self) -> Vec<OutstandingInstallment> {
        self.ledger().outstanding_installments()
    }

    pub fn next_due_installment(&self) -> Option<NextDue> {
        self.ledger().next_due_installment()
    }

    /// Next due date, if any installment is outstanding
    pub fn next_due_date(&self) -> Option<NaiveDate> {
        self.next_due_installment().map(|n| n.due_date)
    }

    /// Checks that a new payment of `amount` can be recorded
    ///
    /// The amount must be positive and must not exceed what is still due.
    pub fn validate_payment(&self, amount: Money) -> Result<(), FeeError> {
        if !amount.is_positive() {
            return Err(FeeError::InvalidAmount(format!(
                "payment amount must be positive, got {}",
                amount
            )));
        }
        let due = self.amount_due();
        if amount > due {
            return Err(FeeError::PaymentExceedsDue { amount, due });
        }
        Ok(())
    }
}

/// A fee record about to be created
#[derive(Debug, Clone)]
pub struct NewStudentFee {
    pub institute_id: InstituteId,
    pub student_id: StudentId,
    pub batch_id: BatchId,
    pub fee_plan_id: Option<FeePlanId>,
    pub total_fee: Money,
    pub discount: Money,
    pub due_schedule: DueSchedule,
}

impl NewStudentFee {
    /// Enforces `total_fee >= discount >= 0` and a usable schedule
    pub fn validate(&self) -> Result<(), FeeError> {
        if self.total_fee.is_negative() {
            return Err(FeeError::InvalidAmount("total fee cannot be negative".to_string()));
        }
        if self.discount.is_negative() {
            return Err(FeeError::InvalidAmount("discount cannot be negative".to_string()));
        }
        if self.discount > self.total_fee {
            return Err(FeeError::DiscountExceedsTotal {
                total_fee: self.total_fee,
                discount: self.discount,
            });
        }
        self.due_schedule.validate_for_creation()
    }

    /// Builds the stored record with no payments
    pub fn into_student_fee(self, now: DateTime<Utc>) -> StudentFee {
        StudentFee {
            id: StudentFeeId::new_v7(),
            institute_id: self.institute_id,
            student_id: self.student_id,
            batch_id: self.batch_id,
            fee_plan_id: self.fee_plan_id,
            total_fee: self.total_fee,
            discount: self.discount,
            due_schedule: self.due_schedule,
            payments: Vec::new(),
            created_at: now,
        }
    }
}
