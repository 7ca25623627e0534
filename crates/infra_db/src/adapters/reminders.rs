//! PostgreSQL Reminder Rule Adapter

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    BatchId, DomainPort, HealthCheckResult, HealthCheckable, InstituteId, PortError, ReminderRuleId,
};
use domain_reminders::{NewReminderRule, ReminderRule, ReminderRulePort};

use crate::error::db_to_port_error;
use crate::repositories::reminders::{ReminderRuleRepository, ReminderRuleRow};

/// PostgreSQL-backed implementation of `ReminderRulePort`
#[derive(Debug, Clone)]
pub struct PostgresReminderRuleAdapter {
    repository: ReminderRuleRepository,
    pool: PgPool,
}

impl PostgresReminderRuleAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ReminderRuleRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresReminderRuleAdapter {}

#[async_trait]
impl HealthCheckable for PostgresReminderRuleAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-reminder-rule-adapter").await
    }
}

#[async_trait]
impl ReminderRulePort for PostgresReminderRuleAdapter {
    #[instrument(skip(self))]
    async fn list_active(&self, institute_id: Option<InstituteId>) -> Result<Vec<ReminderRule>, PortError> {
        let rows = self
            .repository
            .list_active(institute_id.map(Uuid::from))
            .await
            .map_err(db_to_port_error)?;
        rows.into_iter().map(row_to_rule).collect()
    }

    #[instrument(skip(self), fields(institute_id = %institute_id))]
    async fn list_for_institute(&self, institute_id: InstituteId) -> Result<Vec<ReminderRule>, PortError> {
        let rows = self
            .repository
            .list_for_institute(institute_id.into())
            .await
            .map_err(db_to_port_error)?;
        rows.into_iter().map(row_to_rule).collect()
    }

    #[instrument(skip(self), fields(rule_id = %id))]
    async fn get(&self, id: ReminderRuleId) -> Result<ReminderRule, PortError> {
        let row = self.repository.get(id.into()).await.map_err(db_to_port_error)?;
        row_to_rule(row)
    }

    #[instrument(skip(self, rule), fields(institute_id = %rule.institute_id))]
    async fn create(&self, rule: NewReminderRule) -> Result<ReminderRule, PortError> {
        debug!(name = %rule.name, "creating reminder rule");

        let rule = rule.into_rule(Utc::now());
        let row = self
            .repository
            .insert(&rule_to_row(&rule))
            .await
            .map_err(db_to_port_error)?;
        row_to_rule(row)
    }

    #[instrument(skip(self, rule), fields(rule_id = %rule.id))]
    async fn update(&self, rule: ReminderRule) -> Result<ReminderRule, PortError> {
        let row = self
            .repository
            .update(&rule_to_row(&rule))
            .await
            .map_err(db_to_port_error)?;
        row_to_rule(row)
    }

    #[instrument(skip(self), fields(rule_id = %id))]
    async fn delete(&self, id: ReminderRuleId) -> Result<(), PortError> {
        self.repository.delete(id.into()).await.map_err(db_to_port_error)
    }
}

fn day_count(value: i32, column: &str) -> Result<u32, PortError> {
    u32::try_from(value)
        .map_err(|_| PortError::transformation(format!("negative {column} on reminder rule: {value}")))
}

fn row_to_rule(row: ReminderRuleRow) -> Result<ReminderRule, PortError> {
    Ok(ReminderRule {
        id: ReminderRuleId::from(row.id),
        institute_id: InstituteId::from(row.institute_id),
        batch_id: row.batch_id.map(BatchId::from),
        name: row.name,
        days_before: day_count(row.days_before, "days_before")?,
        on_due_date: row.on_due_date,
        every_n_days_after_due: day_count(row.every_n_days_after_due, "every_n_days_after_due")?,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn rule_to_row(rule: &ReminderRule) -> ReminderRuleRow {
    ReminderRuleRow {
        id: rule.id.into(),
        institute_id: rule.institute_id.into(),
        batch_id: rule.batch_id.map(Uuid::from),
        name: rule.name.clone(),
        days_before: i32::try_from(rule.days_before).unwrap_or(i32::MAX),
        on_due_date: rule.on_due_date,
        every_n_days_after_due: i32::try_from(rule.every_n_days_after_due).unwrap_or(i32::MAX),
        is_active: rule.is_active,
        created_at: rule.created_at,
        updated_at: rule.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(days_before: i32) -> ReminderRuleRow {
        ReminderRuleRow {
            id: Uuid::new_v4(),
            institute_id: Uuid::new_v4(),
            batch_id: None,
            name: "Default".to_string(),
            days_before,
            on_due_date: true,
            every_n_days_after_due: 3,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let rule = row_to_rule(row(5)).unwrap();
        assert_eq!(rule.days_before, 5);
        assert!(rule.batch_id.is_none());
        assert_eq!(rule_to_row(&rule).days_before, 5);
    }

    #[test]
    fn test_negative_day_count_rejected() {
        assert!(matches!(row_to_rule(row(-1)), Err(PortError::Transformation { .. })));
    }
}
