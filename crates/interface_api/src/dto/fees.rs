//! Fee ledger DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use core_kernel::{BatchId, FeePlanId, Money, StudentFeeId, StudentId};
use domain_fees::{DueSchedule, Installment, StudentFee};

fn positive_money(value: &Money) -> Result<(), ValidationError> {
    if value.is_positive() {
        Ok(())
    } else {
        Err(ValidationError::new("positive").with_message("must be greater than zero".into()))
    }
}

fn non_negative_money(value: &Money) -> Result<(), ValidationError> {
    if value.is_negative() {
        Err(ValidationError::new("non_negative").with_message("must not be negative".into()))
    } else {
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InstallmentRequest {
    pub due_date: NaiveDate,
    #[validate(custom(function = "positive_money"))]
    pub amount: Money,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentFeeRequest {
    pub student_id: Uuid,
    pub batch_id: Uuid,
    pub fee_plan_id: Option<Uuid>,
    #[validate(custom(function = "non_negative_money"))]
    pub total_fee: Money,
    #[serde(default)]
    #[validate(custom(function = "non_negative_money"))]
    pub discount: Money,
    #[validate(length(min = 1, message = "at least one installment is required"), nested)]
    pub due_schedule: Vec<InstallmentRequest>,
}

impl CreateStudentFeeRequest {
    pub fn schedule(&self) -> DueSchedule {
        DueSchedule::new(
            self.due_schedule
                .iter()
                .map(|i| Installment::new(i.due_date, i.amount))
                .collect(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentFeeListQuery {
    pub student_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct NextDueResponse {
    pub due_date: NaiveDate,
    pub amount: Money,
}

/// A fee record with its computed balances
#[derive(Debug, Serialize)]
pub struct StudentFeeResponse {
    pub id: StudentFeeId,
    pub student_id: StudentId,
    pub batch_id: BatchId,
    pub fee_plan_id: Option<FeePlanId>,
    pub total_fee: Money,
    pub discount: Money,
    pub due_schedule: DueSchedule,
    pub paid_amount: Money,
    pub due_amount: Money,
    pub next_due: Option<NextDueResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<&StudentFee> for StudentFeeResponse {
    fn from(fee: &StudentFee) -> Self {
        let ledger = fee.ledger();
        Self {
            id: fee.id,
            student_id: fee.student_id,
            batch_id: fee.batch_id,
            fee_plan_id: fee.fee_plan_id,
            total_fee: fee.total_fee,
            discount: fee.discount,
            due_schedule: fee.due_schedule.clone(),
            paid_amount: ledger.amount_paid(),
            due_amount: ledger.amount_due(),
            next_due: ledger.next_due_installment().map(|n| NextDueResponse {
                due_date: n.due_date,
                amount: n.outstanding_amount,
            }),
            created_at: fee.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub student_fee_id: Uuid,
    #[validate(custom(function = "positive_money"))]
    pub amount: Money,
    pub paid_on: NaiveDate,
    /// CASH, UPI or BANK
    pub mode: String,
    #[validate(length(max = 500))]
    pub remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentListQuery {
    pub student_fee_id: Option<Uuid>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DuesQuery {
    pub batch_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
}
