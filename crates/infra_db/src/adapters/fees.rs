//! PostgreSQL Fee Ledger Adapter
//!
//! Implements `FeeLedgerPort` over [`FeeRepository`]. Fees are always
//! returned with their payments attached.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    BatchId, DomainPort, FeePlanId, HealthCheckResult, HealthCheckable, InstituteId, Money,
    PaymentId, PortError, StudentFeeId, StudentId, UserId,
};
use domain_fees::{
    DueSchedule, FeeLedgerPort, FeeQuery, NewStudentFee, Payment, PaymentMode, PaymentOutcome,
    PaymentQuery, StudentFee,
};

use crate::error::db_to_port_error;
use crate::repositories::fees::{FeeRepository, PaymentRow, PaymentWrite, StudentFeeRow};

/// PostgreSQL-backed implementation of `FeeLedgerPort`
#[derive(Debug, Clone)]
pub struct PostgresFeeLedgerAdapter {
    repository: FeeRepository,
    pool: PgPool,
}

impl PostgresFeeLedgerAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: FeeRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &FeeRepository {
        &self.repository
    }

    /// Loads payments for `rows` and assembles domain fees in row order
    async fn with_payments(&self, rows: Vec<StudentFeeRow>) -> Result<Vec<StudentFee>, PortError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let payment_rows = self
            .repository
            .payments_for_fees(&ids)
            .await
            .map_err(db_to_port_error)?;

        let mut by_fee: HashMap<Uuid, Vec<Payment>> = HashMap::new();
        for row in payment_rows {
            by_fee.entry(row.student_fee_id).or_default().push(row_to_payment(row)?);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let payments = by_fee.remove(&row.id).unwrap_or_default();
                row_to_fee(row, payments)
            })
            .collect())
    }
}

impl DomainPort for PostgresFeeLedgerAdapter {}

#[async_trait]
impl HealthCheckable for PostgresFeeLedgerAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-fee-ledger-adapter").await
    }
}

#[async_trait]
impl FeeLedgerPort for PostgresFeeLedgerAdapter {
    #[instrument(skip(self), fields(student_fee_id = %id))]
    async fn get_student_fee(&self, id: StudentFeeId) -> Result<StudentFee, PortError> {
        debug!("fetching student fee");

        let row = self
            .repository
            .get_fee(id.into())
            .await
            .map_err(db_to_port_error)?;

        let mut fees = self.with_payments(vec![row]).await?;
        fees.pop().ok_or_else(|| PortError::not_found("StudentFee", id))
    }

    #[instrument(skip(self))]
    async fn list_student_fees(&self, query: FeeQuery) -> Result<Vec<StudentFee>, PortError> {
        let rows = self
            .repository
            .list_fees(
                query.institute_id.map(Uuid::from),
                query.student_id.map(Uuid::from),
                query.batch_id.map(Uuid::from),
            )
            .await
            .map_err(db_to_port_error)?;

        debug!(count = rows.len(), "listed student fees");
        self.with_payments(rows).await
    }

    #[instrument(skip(self), fields(student_id = %student_id, batch_id = %batch_id))]
    async fn find_by_student_batch(
        &self,
        student_id: StudentId,
        batch_id: BatchId,
    ) -> Result<Option<StudentFee>, PortError> {
        let row = self
            .repository
            .find_by_student_batch(student_id.into(), batch_id.into())
            .await
            .map_err(db_to_port_error)?;

        match row {
            Some(row) => Ok(self.with_payments(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, fee), fields(student_id = %fee.student_id, batch_id = %fee.batch_id))]
    async fn create_student_fee(&self, fee: NewStudentFee) -> Result<StudentFee, PortError> {
        debug!("creating student fee");

        let fee = fee.into_student_fee(Utc::now());
        let row = self
            .repository
            .insert_fee(&fee_to_row(&fee))
            .await
            .map_err(db_to_port_error)?;

        Ok(row_to_fee(row, Vec::new()))
    }

    #[instrument(skip(self, payment), fields(student_fee_id = %payment.student_fee_id, receipt_no = %payment.receipt_no))]
    async fn record_payment(&self, payment: Payment) -> Result<PaymentOutcome, PortError> {
        debug!("recording payment");

        let write = self
            .repository
            .insert_payment(&payment_to_row(&payment))
            .await
            .map_err(db_to_port_error)?;

        match write {
            PaymentWrite::Inserted(row) => Ok(PaymentOutcome::Recorded(row_to_payment(row)?)),
            PaymentWrite::ExceedsDue(due) => {
                debug!(due = %due, "payment rejected at write time");
                Ok(PaymentOutcome::ExceedsDue {
                    amount: payment.amount,
                    due: Money::new(due),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn list_payments(&self, query: PaymentQuery) -> Result<Vec<Payment>, PortError> {
        let rows = self
            .repository
            .list_payments(
                query.institute_id.into(),
                query.student_fee_id.map(Uuid::from),
                query.student_id.map(Uuid::from),
            )
            .await
            .map_err(db_to_port_error)?;

        rows.into_iter().map(row_to_payment).collect()
    }
}

// =============================================================================
// Conversion Functions
// =============================================================================

fn row_to_fee(row: StudentFeeRow, payments: Vec<Payment>) -> StudentFee {
    StudentFee {
        id: StudentFeeId::from(row.id),
        institute_id: InstituteId::from(row.institute_id),
        student_id: StudentId::from(row.student_id),
        batch_id: BatchId::from(row.batch_id),
        fee_plan_id: row.fee_plan_id.map(FeePlanId::from),
        total_fee: Money::new(row.total_fee),
        discount: Money::new(row.discount),
        due_schedule: DueSchedule::from_json(&row.due_schedule),
        payments,
        created_at: row.created_at,
    }
}

fn fee_to_row(fee: &StudentFee) -> StudentFeeRow {
    StudentFeeRow {
        id: fee.id.into(),
        institute_id: fee.institute_id.into(),
        student_id: fee.student_id.into(),
        batch_id: fee.batch_id.into(),
        fee_plan_id: fee.fee_plan_id.map(Uuid::from),
        total_fee: fee.total_fee.amount(),
        discount: fee.discount.amount(),
        due_schedule: fee.due_schedule.to_json(),
        created_at: fee.created_at,
    }
}

fn row_to_payment(row: PaymentRow) -> Result<Payment, PortError> {
    let mode: PaymentMode = row
        .mode
        .parse()
        .map_err(|_| PortError::transformation(format!("unknown payment mode '{}'", row.mode)))?;

    Ok(Payment {
        id: PaymentId::from(row.id),
        institute_id: InstituteId::from(row.institute_id),
        student_fee_id: StudentFeeId::from(row.student_fee_id),
        amount: Money::new(row.amount),
        paid_on: row.paid_on,
        mode,
        receipt_no: row.receipt_no,
        remarks: row.remarks,
        created_by: row.created_by.map(UserId::from),
        created_at: row.created_at,
    })
}

fn payment_to_row(payment: &Payment) -> PaymentRow {
    PaymentRow {
        id: payment.id.into(),
        institute_id: payment.institute_id.into(),
        student_fee_id: payment.student_fee_id.into(),
        amount: payment.amount.amount(),
        paid_on: payment.paid_on,
        mode: payment.mode.as_str().to_string(),
        receipt_no: payment.receipt_no.clone(),
        remarks: payment.remarks.clone(),
        created_by: payment.created_by.map(Uuid::from),
        created_at: payment.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn fee_row(schedule: serde_json::Value) -> StudentFeeRow {
        StudentFeeRow {
            id: Uuid::new_v4(),
            institute_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            batch_id: Uuid::new_v4(),
            fee_plan_id: None,
            total_fee: Decimal::new(1000000, 2),
            discount: Decimal::new(50000, 2),
            due_schedule: schedule,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_mixed_schedule_amounts_are_coerced() {
        let row = fee_row(json!([
            {"due_date": "2024-02-01", "amount": "4500.00"},
            {"due_date": "2024-03-01", "amount": 5000},
            {"due_date": "not-a-date", "amount": 10}
        ]));
        let fee = row_to_fee(row, Vec::new());
        assert_eq!(fee.due_schedule.len(), 2);
        assert_eq!(fee.due_schedule.total(), Money::from_major(9500));
        assert_eq!(fee.amount_due(), Money::from_major(9500));
    }

    #[test]
    fn test_non_array_schedule_is_empty() {
        let fee = row_to_fee(fee_row(json!({"oops": true})), Vec::new());
        assert!(fee.due_schedule.is_empty());
    }

    #[test]
    fn test_fee_row_round_trip_keeps_amounts() {
        let fee = row_to_fee(
            fee_row(json!([{"due_date": "2024-02-01", "amount": "9500.00"}])),
            Vec::new(),
        );
        let row = fee_to_row(&fee);
        assert_eq!(row.total_fee, Decimal::new(1000000, 2));
        assert_eq!(row.due_schedule[0]["amount"], json!("9500.00"));
    }

    #[test]
    fn test_unknown_payment_mode_is_transformation_error() {
        let row = PaymentRow {
            id: Uuid::new_v4(),
            institute_id: Uuid::new_v4(),
            student_fee_id: Uuid::new_v4(),
            amount: Decimal::new(100, 0),
            paid_on: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            mode: "CHEQUE".to_string(),
            receipt_no: "RCPT-1".to_string(),
            remarks: None,
            created_by: None,
            created_at: Utc::now(),
        };
        assert!(matches!(row_to_payment(row), Err(PortError::Transformation { .. })));
    }
}
