//! Student fee and payment repository
//!
//! Fees keep their installment plan as a JSONB document; payments are rows
//! of their own and are attached to fees by the adapter.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for `student_fees` and `payments`
#[derive(Debug, Clone)]
pub struct FeeRepository {
    pool: PgPool,
}

impl FeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a fee by id or `NotFound`
    pub async fn get_fee(&self, id: Uuid) -> Result<StudentFeeRow, DatabaseError> {
        sqlx::query_as::<_, StudentFeeRow>(
            r#"
            SELECT id, institute_id, student_id, batch_id, fee_plan_id,
                   total_fee, discount, due_schedule, created_at
            FROM student_fees
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("StudentFee", id))
    }

    /// Lists fees, newest first
    ///
    /// Each `None` filter matches every row.
    pub async fn list_fees(
        &self,
        institute_id: Option<Uuid>,
        student_id: Option<Uuid>,
        batch_id: Option<Uuid>,
    ) -> Result<Vec<StudentFeeRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, StudentFeeRow>(
            r#"
            SELECT id, institute_id, student_id, batch_id, fee_plan_id,
                   total_fee, discount, due_schedule, created_at
            FROM student_fees
            WHERE ($1::uuid IS NULL OR institute_id = $1)
              AND ($2::uuid IS NULL OR student_id = $2)
              AND ($3::uuid IS NULL OR batch_id = $3)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(institute_id)
        .bind(student_id)
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn find_by_student_batch(
        &self,
        student_id: Uuid,
        batch_id: Uuid,
    ) -> Result<Option<StudentFeeRow>, DatabaseError> {
        let row = sqlx::query_as::<_, StudentFeeRow>(
            r#"
            SELECT id, institute_id, student_id, batch_id, fee_plan_id,
                   total_fee, discount, due_schedule, created_at
            FROM student_fees
            WHERE student_id = $1 AND batch_id = $2
            "#,
        )
        .bind(student_id)
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Inserts a fee
    ///
    /// A second fee for the same student and batch fails with `DuplicateEntry`.
    pub async fn insert_fee(&self, fee: &StudentFeeRow) -> Result<StudentFeeRow, DatabaseError> {
        let row = sqlx::query_as::<_, StudentFeeRow>(
            r#"
            INSERT INTO student_fees (
                id, institute_id, student_id, batch_id, fee_plan_id,
                total_fee, discount, due_schedule, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, institute_id, student_id, batch_id, fee_plan_id,
                      total_fee, discount, due_schedule, created_at
            "#,
        )
        .bind(fee.id)
        .bind(fee.institute_id)
        .bind(fee.student_id)
        .bind(fee.batch_id)
        .bind(fee.fee_plan_id)
        .bind(fee.total_fee)
        .bind(fee.discount)
        .bind(&fee.due_schedule)
        .bind(fee.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::DuplicateEntry(_) => DatabaseError::duplicate(
                "StudentFee",
                "student and batch",
                format!("{}/{}", fee.student_id, fee.batch_id),
            ),
            other => other,
        })?;

        Ok(row)
    }

    /// Payments of the given fees, oldest first
    pub async fn payments_for_fees(&self, fee_ids: &[Uuid]) -> Result<Vec<PaymentRow>, DatabaseError> {
        if fee_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, institute_id, student_fee_id, amount, paid_on, mode,
                   receipt_no, remarks, created_by, created_at
            FROM payments
            WHERE student_fee_id = ANY($1)
            ORDER BY paid_on ASC, created_at ASC
            "#,
        )
        .bind(fee_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Inserts a payment if it fits what is still owed on its fee
    ///
    /// The fee row is locked `FOR UPDATE` and the amount due is recomputed
    /// from committed payments inside the same transaction, so concurrent
    /// payments on one fee are checked one after the other. A reused receipt
    /// number fails with `DuplicateEntry`.
    pub async fn insert_payment(&self, payment: &PaymentRow) -> Result<PaymentWrite, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let (total_fee, discount) = sqlx::query_as::<_, (Decimal, Decimal)>(
            "SELECT total_fee, discount FROM student_fees WHERE id = $1 FOR UPDATE",
        )
        .bind(payment.student_fee_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::not_found("StudentFee", payment.student_fee_id))?;

        let paid = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE student_fee_id = $1",
        )
        .bind(payment.student_fee_id)
        .fetch_one(&mut *tx)
        .await?;

        let due = ((total_fee - discount).max(Decimal::ZERO) - paid).max(Decimal::ZERO);
        if payment.amount > due {
            tx.rollback().await?;
            return Ok(PaymentWrite::ExceedsDue(due));
        }

        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            INSERT INTO payments (
                id, institute_id, student_fee_id, amount, paid_on, mode,
                receipt_no, remarks, created_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, institute_id, student_fee_id, amount, paid_on, mode,
                      receipt_no, remarks, created_by, created_at
            "#,
        )
        .bind(payment.id)
        .bind(payment.institute_id)
        .bind(payment.student_fee_id)
        .bind(payment.amount)
        .bind(payment.paid_on)
        .bind(&payment.mode)
        .bind(&payment.receipt_no)
        .bind(&payment.remarks)
        .bind(payment.created_by)
        .bind(payment.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::DuplicateEntry(_) => {
                DatabaseError::duplicate("Payment", "receipt_no", &payment.receipt_no)
            }
            other => other,
        })?;

        tx.commit().await?;
        Ok(PaymentWrite::Inserted(row))
    }

    /// Lists payments of an institute, newest first
    pub async fn list_payments(
        &self,
        institute_id: Uuid,
        student_fee_id: Option<Uuid>,
        student_id: Option<Uuid>,
    ) -> Result<Vec<PaymentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT p.id, p.institute_id, p.student_fee_id, p.amount, p.paid_on, p.mode,
                   p.receipt_no, p.remarks, p.created_by, p.created_at
            FROM payments p
            JOIN student_fees sf ON sf.id = p.student_fee_id
            WHERE p.institute_id = $1
              AND ($2::uuid IS NULL OR p.student_fee_id = $2)
              AND ($3::uuid IS NULL OR sf.student_id = $3)
            ORDER BY p.paid_on DESC, p.created_at DESC
            "#,
        )
        .bind(institute_id)
        .bind(student_fee_id)
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// Result of [`FeeRepository::insert_payment`]
#[derive(Debug, Clone)]
pub enum PaymentWrite {
    Inserted(PaymentRow),
    /// Rolled back; carries the amount due at write time
    ExceedsDue(Decimal),
}

/// Database row for `student_fees`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentFeeRow {
    pub id: Uuid,
    pub institute_id: Uuid,
    pub student_id: Uuid,
    pub batch_id: Uuid,
    pub fee_plan_id: Option<Uuid>,
    pub total_fee: Decimal,
    pub discount: Decimal,
    /// Installment plan document
    pub due_schedule: Value,
    pub created_at: DateTime<Utc>,
}

/// Database row for `payments`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub institute_id: Uuid,
    pub student_fee_id: Uuid,
    pub amount: Decimal,
    pub paid_on: NaiveDate,
    /// CASH, UPI or BANK
    pub mode: String,
    pub receipt_no: String,
    pub remarks: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
