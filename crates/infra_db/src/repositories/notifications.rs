//! Notification repository
//!
//! Fee reminders are protected by a unique partial index over the student
//! and the `student_fee_id`, `due_date` and `trigger_day` metadata keys.
//! Inserts that hit it are silently skipped.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::format_iso_date;

use crate::error::DatabaseError;

/// Restricts a listing to what one student may see
#[derive(Debug, Clone)]
pub struct AudienceFilter {
    pub student_id: Uuid,
    pub batch_ids: Vec<Uuid>,
}

/// Repository for `notifications`
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a notification
    ///
    /// Returns `None` when a fee reminder with the same dedup key exists.
    pub async fn insert(&self, notification: &NotificationRow) -> Result<Option<NotificationRow>, DatabaseError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (
                id, institute_id, student_id, batch_id, type, message, meta, created_at, read_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT DO NOTHING
            RETURNING id, institute_id, student_id, batch_id, type AS notification_type,
                      message, meta, created_at, read_at
            "#,
        )
        .bind(notification.id)
        .bind(notification.institute_id)
        .bind(notification.student_id)
        .bind(notification.batch_id)
        .bind(&notification.notification_type)
        .bind(&notification.message)
        .bind(&notification.meta)
        .bind(notification.created_at)
        .bind(notification.read_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Student and metadata of the fee reminders triggered on `run_date`
    pub async fn prior_reminders(
        &self,
        run_date: NaiveDate,
        institute_id: Option<Uuid>,
    ) -> Result<Vec<PriorReminderRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PriorReminderRow>(
            r#"
            SELECT student_id, meta
            FROM notifications
            WHERE type = 'FEE_REMINDER'
              AND meta->>'trigger_day' = $1
              AND ($2::uuid IS NULL OR institute_id = $2)
            "#,
        )
        .bind(format_iso_date(run_date))
        .bind(institute_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// One page of an institute's notifications, newest first, with the total count
    pub async fn list(
        &self,
        institute_id: Uuid,
        notification_type: Option<&str>,
        audience: Option<&AudienceFilter>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<NotificationRow>, i64), DatabaseError> {
        let student_id = audience.map(|a| a.student_id);
        let batch_ids: Vec<Uuid> = audience.map(|a| a.batch_ids.clone()).unwrap_or_default();

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE institute_id = $1
              AND ($2::text IS NULL OR type = $2)
              AND ($3::uuid IS NULL
                   OR student_id = $3
                   OR (student_id IS NULL AND (batch_id IS NULL OR batch_id = ANY($4))))
            "#,
        )
        .bind(institute_id)
        .bind(notification_type)
        .bind(student_id)
        .bind(&batch_ids)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, institute_id, student_id, batch_id, type AS notification_type,
                   message, meta, created_at, read_at
            FROM notifications
            WHERE institute_id = $1
              AND ($2::text IS NULL OR type = $2)
              AND ($3::uuid IS NULL
                   OR student_id = $3
                   OR (student_id IS NULL AND (batch_id IS NULL OR batch_id = ANY($4))))
            ORDER BY created_at DESC, id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(institute_id)
        .bind(notification_type)
        .bind(student_id)
        .bind(&batch_ids)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<NotificationRow, DatabaseError> {
        sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, institute_id, student_id, batch_id, type AS notification_type,
                   message, meta, created_at, read_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Notification", id))
    }

    /// Sets `read_at` unless already set
    pub async fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<NotificationRow, DatabaseError> {
        sqlx::query_as::<_, NotificationRow>(
            r#"
            UPDATE notifications
            SET read_at = COALESCE(read_at, $2)
            WHERE id = $1
            RETURNING id, institute_id, student_id, batch_id, type AS notification_type,
                      message, meta, created_at, read_at
            "#,
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Notification", id))
    }
}

/// Database row for `notifications`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub institute_id: Uuid,
    pub student_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    /// The `type` column
    pub notification_type: String,
    pub message: String,
    pub meta: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriorReminderRow {
    pub student_id: Option<Uuid>,
    pub meta: Option<Value>,
}
