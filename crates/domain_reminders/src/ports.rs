//! Reminder Domain Ports
//!
//! `ReminderRulePort` stores the configured rules and `NotificationPort` is
//! the sink reminders are written through. Postgres adapters live in
//! `infra_db`; in-memory adapters live in [`mock`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use core_kernel::{
    DomainPort, HealthCheckable, InstituteId, NotificationId, Page, PortError, ReminderRuleId,
};

use crate::notification::{AppendOutcome, NewNotification, Notification, NotificationQuery, PriorReminder};
use crate::rule::{NewReminderRule, ReminderRule, ReminderRuleUpdate};

/// Storage for reminder rules
#[async_trait]
pub trait ReminderRulePort: DomainPort + HealthCheckable {
    /// Active rules, optionally limited to one institute, oldest first
    async fn list_active(&self, institute_id: Option<InstituteId>) -> Result<Vec<ReminderRule>, PortError>;

    /// All rules of an institute, newest first
    async fn list_for_institute(&self, institute_id: InstituteId) -> Result<Vec<ReminderRule>, PortError>;

    /// Retrieves a rule, or `PortError::NotFound`
    async fn get(&self, id: ReminderRuleId) -> Result<ReminderRule, PortError>;

    async fn create(&self, rule: NewReminderRule) -> Result<ReminderRule, PortError>;

    /// Replaces the stored rule with `rule`
    async fn update(&self, rule: ReminderRule) -> Result<ReminderRule, PortError>;

    async fn delete(&self, id: ReminderRuleId) -> Result<(), PortError>;
}

/// Append-mostly notification store
#[async_trait]
pub trait NotificationPort: DomainPort + HealthCheckable {
    /// Stores a notification
    ///
    /// Fee reminders whose dedup key already exists are not stored and
    /// report [`AppendOutcome::Duplicate`].
    async fn append(&self, notification: NewNotification) -> Result<AppendOutcome, PortError>;

    /// Student and metadata of stored fee reminders triggered on `run_date`
    async fn prior_reminders(
        &self,
        run_date: NaiveDate,
        institute_id: Option<InstituteId>,
    ) -> Result<Vec<PriorReminder>, PortError>;

    async fn list(&self, query: NotificationQuery) -> Result<Page<Notification>, PortError>;

    /// Retrieves a notification, or `PortError::NotFound`
    async fn get(&self, id: NotificationId) -> Result<Notification, PortError>;

    /// Sets `read_at`; marking twice keeps the first timestamp
    async fn mark_read(&self, id: NotificationId, at: DateTime<Utc>) -> Result<Notification, PortError>;
}

/// In-memory implementations for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use core_kernel::HealthCheckResult;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use crate::notification::NotificationType;

    /// In-memory rule store
    #[derive(Debug, Default, Clone)]
    pub struct MockReminderRulePort {
        rules: Arc<RwLock<Vec<ReminderRule>>>,
    }

    impl MockReminderRulePort {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_rules(rules: Vec<ReminderRule>) -> Self {
            let port = Self::new();
            *port.rules.write().await = rules;
            port
        }
    }

    impl DomainPort for MockReminderRulePort {}

    #[async_trait]
    impl HealthCheckable for MockReminderRulePort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-reminder-rule-port")
        }
    }

    #[async_trait]
    impl ReminderRulePort for MockReminderRulePort {
        async fn list_active(&self, institute_id: Option<InstituteId>) -> Result<Vec<ReminderRule>, PortError> {
            Ok(self
                .rules
                .read()
                .await
                .iter()
                .filter(|r| r.is_active && institute_id.map_or(true, |i| r.institute_id == i))
                .cloned()
                .collect())
        }

        async fn list_for_institute(&self, institute_id: InstituteId) -> Result<Vec<ReminderRule>, PortError> {
            let mut rules: Vec<ReminderRule> = self
                .rules
                .read()
                .await
                .iter()
                .filter(|r| r.institute_id == institute_id)
                .cloned()
                .collect();
            rules.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rules)
        }

        async fn get(&self, id: ReminderRuleId) -> Result<ReminderRule, PortError> {
            self.rules
                .read()
                .await
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| PortError::not_found("ReminderRule", id))
        }

        async fn create(&self, rule: NewReminderRule) -> Result<ReminderRule, PortError> {
            let created = rule.into_rule(Utc::now());
            self.rules.write().await.push(created.clone());
            Ok(created)
        }

        async fn update(&self, rule: ReminderRule) -> Result<ReminderRule, PortError> {
            let mut rules = self.rules.write().await;
            let slot = rules
                .iter_mut()
                .find(|r| r.id == rule.id)
                .ok_or_else(|| PortError::not_found("ReminderRule", rule.id))?;
            *slot = rule.clone();
            Ok(rule)
        }

        async fn delete(&self, id: ReminderRuleId) -> Result<(), PortError> {
            let mut rules = self.rules.write().await;
            let before = rules.len();
            rules.retain(|r| r.id != id);
            if rules.len() == before {
                return Err(PortError::not_found("ReminderRule", id));
            }
            Ok(())
        }
    }

    /// In-memory notification store
    ///
    /// Enforces the same dedup key uniqueness as the database index.
    #[derive(Debug, Default, Clone)]
    pub struct MockNotificationPort {
        notifications: Arc<RwLock<HashMap<NotificationId, Notification>>>,
        fail_appends: Arc<AtomicBool>,
    }

    impl MockNotificationPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_notifications(notifications: Vec<Notification>) -> Self {
            let port = Self::new();
            {
                let mut store = port.notifications.write().await;
                for n in notifications {
                    store.insert(n.id, n);
                }
            }
            port
        }

        /// Makes every subsequent append fail with a connection error
        pub fn fail_appends(&self, fail: bool) {
            self.fail_appends.store(fail, Ordering::SeqCst);
        }

        pub async fn all(&self) -> Vec<Notification> {
            let mut all: Vec<Notification> = self.notifications.read().await.values().cloned().collect();
            all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            all
        }

        pub async fn count_of(&self, notification_type: NotificationType) -> usize {
            self.notifications
                .read()
                .await
                .values()
                .filter(|n| n.notification_type == notification_type)
                .count()
        }
    }

    impl DomainPort for MockNotificationPort {}

    #[async_trait]
    impl HealthCheckable for MockNotificationPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-notification-port")
        }
    }

    #[async_trait]
    impl NotificationPort for MockNotificationPort {
        async fn append(&self, notification: NewNotification) -> Result<AppendOutcome, PortError> {
            if self.fail_appends.load(Ordering::SeqCst) {
                return Err(PortError::connection("notification store unavailable"));
            }
            let mut store = self.notifications.write().await;
            if let Some(key) = notification.dedup_key() {
                if store.values().any(|n| n.dedup_key() == Some(key)) {
                    return Ok(AppendOutcome::Duplicate);
                }
            }
            let created = notification.into_notification(Utc::now());
            store.insert(created.id, created.clone());
            Ok(AppendOutcome::Inserted(created))
        }

        async fn prior_reminders(
            &self,
            run_date: NaiveDate,
            institute_id: Option<InstituteId>,
        ) -> Result<Vec<PriorReminder>, PortError> {
            Ok(self
                .notifications
                .read()
                .await
                .values()
                .filter(|n| n.notification_type == NotificationType::FeeReminder)
                .filter(|n| institute_id.map_or(true, |i| n.institute_id == i))
                .map(|n| PriorReminder {
                    student_id: n.student_id,
                    meta: n.meta.clone(),
                })
                .filter(|p| p.dedup_key().is_some_and(|k| k.run_date == run_date))
                .collect())
        }

        async fn list(&self, query: NotificationQuery) -> Result<Page<Notification>, PortError> {
            let mut matching: Vec<Notification> = self
                .notifications
                .read()
                .await
                .values()
                .filter(|n| query.matches(n))
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(Page::from_vec(matching, query.page))
        }

        async fn get(&self, id: NotificationId) -> Result<Notification, PortError> {
            self.notifications
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Notification", id))
        }

        async fn mark_read(&self, id: NotificationId, at: DateTime<Utc>) -> Result<Notification, PortError> {
            let mut store = self.notifications.write().await;
            let notification = store
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Notification", id))?;
            if notification.read_at.is_none() {
                notification.read_at = Some(at);
            }
            Ok(notification.clone())
        }
    }
}
