//! Reminder rule repository

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for `reminder_rules`
#[derive(Debug, Clone)]
pub struct ReminderRuleRepository {
    pool: PgPool,
}

impl ReminderRuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active rules, oldest first; `None` covers every institute
    pub async fn list_active(&self, institute_id: Option<Uuid>) -> Result<Vec<ReminderRuleRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ReminderRuleRow>(
            r#"
            SELECT id, institute_id, batch_id, name, days_before, on_due_date,
                   every_n_days_after_due, is_active, created_at, updated_at
            FROM reminder_rules
            WHERE is_active AND ($1::uuid IS NULL OR institute_id = $1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(institute_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// All rules of an institute, newest first
    pub async fn list_for_institute(&self, institute_id: Uuid) -> Result<Vec<ReminderRuleRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ReminderRuleRow>(
            r#"
            SELECT id, institute_id, batch_id, name, days_before, on_due_date,
                   every_n_days_after_due, is_active, created_at, updated_at
            FROM reminder_rules
            WHERE institute_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(institute_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<ReminderRuleRow, DatabaseError> {
        sqlx::query_as::<_, ReminderRuleRow>(
            r#"
            SELECT id, institute_id, batch_id, name, days_before, on_due_date,
                   every_n_days_after_due, is_active, created_at, updated_at
            FROM reminder_rules
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("ReminderRule", id))
    }

    pub async fn insert(&self, rule: &ReminderRuleRow) -> Result<ReminderRuleRow, DatabaseError> {
        let row = sqlx::query_as::<_, ReminderRuleRow>(
            r#"
            INSERT INTO reminder_rules (
                id, institute_id, batch_id, name, days_before, on_due_date,
                every_n_days_after_due, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, institute_id, batch_id, name, days_before, on_due_date,
                      every_n_days_after_due, is_active, created_at, updated_at
            "#,
        )
        .bind(rule.id)
        .bind(rule.institute_id)
        .bind(rule.batch_id)
        .bind(&rule.name)
        .bind(rule.days_before)
        .bind(rule.on_due_date)
        .bind(rule.every_n_days_after_due)
        .bind(rule.is_active)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Overwrites the mutable columns of an existing rule
    pub async fn update(&self, rule: &ReminderRuleRow) -> Result<ReminderRuleRow, DatabaseError> {
        sqlx::query_as::<_, ReminderRuleRow>(
            r#"
            UPDATE reminder_rules
            SET name = $2,
                days_before = $3,
                on_due_date = $4,
                every_n_days_after_due = $5,
                is_active = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING id, institute_id, batch_id, name, days_before, on_due_date,
                      every_n_days_after_due, is_active, created_at, updated_at
            "#,
        )
        .bind(rule.id)
        .bind(&rule.name)
        .bind(rule.days_before)
        .bind(rule.on_due_date)
        .bind(rule.every_n_days_after_due)
        .bind(rule.is_active)
        .bind(rule.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("ReminderRule", rule.id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM reminder_rules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("ReminderRule", id));
        }
        Ok(())
    }
}

/// Database row for `reminder_rules`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReminderRuleRow {
    pub id: Uuid,
    pub institute_id: Uuid,
    /// `NULL` applies to every batch of the institute
    pub batch_id: Option<Uuid>,
    pub name: String,
    pub days_before: i32,
    pub on_due_date: bool,
    pub every_n_days_after_due: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
