//! PostgreSQL Notification Adapter
//!
//! Appends go through `INSERT .. ON CONFLICT DO NOTHING`; a fee reminder
//! that collides with the dedup index reports `AppendOutcome::Duplicate`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    BatchId, DomainPort, HealthCheckResult, HealthCheckable, InstituteId, NotificationId, Page,
    PortError, StudentId,
};
use domain_reminders::{
    AppendOutcome, NewNotification, Notification, NotificationPort, NotificationQuery,
    NotificationType, PriorReminder,
};

use crate::error::db_to_port_error;
use crate::repositories::notifications::{AudienceFilter, NotificationRepository, NotificationRow};

/// PostgreSQL-backed implementation of `NotificationPort`
#[derive(Debug, Clone)]
pub struct PostgresNotificationAdapter {
    repository: NotificationRepository,
    pool: PgPool,
}

impl PostgresNotificationAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: NotificationRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresNotificationAdapter {}

#[async_trait]
impl HealthCheckable for PostgresNotificationAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(&self.pool, "postgres-notification-adapter").await
    }
}

#[async_trait]
impl NotificationPort for PostgresNotificationAdapter {
    #[instrument(skip(self, notification), fields(notification_type = %notification.notification_type))]
    async fn append(&self, notification: NewNotification) -> Result<AppendOutcome, PortError> {
        let notification = notification.into_notification(Utc::now());
        let inserted = self
            .repository
            .insert(&notification_to_row(&notification))
            .await
            .map_err(db_to_port_error)?;

        match inserted {
            Some(row) => Ok(AppendOutcome::Inserted(row_to_notification(row)?)),
            None => {
                debug!("notification suppressed by dedup index");
                Ok(AppendOutcome::Duplicate)
            }
        }
    }

    #[instrument(skip(self))]
    async fn prior_reminders(
        &self,
        run_date: NaiveDate,
        institute_id: Option<InstituteId>,
    ) -> Result<Vec<PriorReminder>, PortError> {
        let rows = self
            .repository
            .prior_reminders(run_date, institute_id.map(Uuid::from))
            .await
            .map_err(db_to_port_error)?;

        Ok(rows
            .into_iter()
            .map(|row| PriorReminder {
                student_id: row.student_id.map(StudentId::from),
                meta: row.meta,
            })
            .collect())
    }

    #[instrument(skip(self, query), fields(institute_id = %query.institute_id))]
    async fn list(&self, query: NotificationQuery) -> Result<Page<Notification>, PortError> {
        let audience = query.audience.as_ref().map(|a| AudienceFilter {
            student_id: a.student_id.into(),
            batch_ids: a.batch_ids.iter().copied().map(Uuid::from).collect(),
        });

        let (rows, total) = self
            .repository
            .list(
                query.institute_id.into(),
                query.notification_type.map(|t| t.as_str()),
                audience.as_ref(),
                query.page.limit() as i64,
                query.page.offset() as i64,
            )
            .await
            .map_err(db_to_port_error)?;

        let items = rows
            .into_iter()
            .map(row_to_notification)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            total: total.max(0) as u64,
            page: query.page.page,
            page_size: query.page.page_size,
            items,
        })
    }

    #[instrument(skip(self), fields(notification_id = %id))]
    async fn get(&self, id: NotificationId) -> Result<Notification, PortError> {
        let row = self.repository.get(id.into()).await.map_err(db_to_port_error)?;
        row_to_notification(row)
    }

    #[instrument(skip(self), fields(notification_id = %id))]
    async fn mark_read(&self, id: NotificationId, at: DateTime<Utc>) -> Result<Notification, PortError> {
        let row = self
            .repository
            .mark_read(id.into(), at)
            .await
            .map_err(db_to_port_error)?;
        row_to_notification(row)
    }
}

fn row_to_notification(row: NotificationRow) -> Result<Notification, PortError> {
    let notification_type: NotificationType = row
        .notification_type
        .parse()
        .map_err(PortError::transformation)?;

    Ok(Notification {
        id: NotificationId::from(row.id),
        institute_id: InstituteId::from(row.institute_id),
        student_id: row.student_id.map(StudentId::from),
        batch_id: row.batch_id.map(BatchId::from),
        notification_type,
        message: row.message,
        meta: row.meta,
        created_at: row.created_at,
        read_at: row.read_at,
    })
}

fn notification_to_row(notification: &Notification) -> NotificationRow {
    NotificationRow {
        id: notification.id.into(),
        institute_id: notification.institute_id.into(),
        student_id: notification.student_id.map(Uuid::from),
        batch_id: notification.batch_id.map(Uuid::from),
        notification_type: notification.notification_type.as_str().to_string(),
        message: notification.message.clone(),
        meta: notification.meta.clone(),
        created_at: notification.created_at,
        read_at: notification.read_at,
    }
}
