//! Reminder engine tests against the in-memory ports

use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use core_kernel::{BatchId, InstituteId, Money, PaymentId, StudentId};
use domain_fees::{
    BatchProfile, DueSchedule, Installment, MockDirectoryPort, MockFeeLedgerPort, NewStudentFee,
    Payment, PaymentMode, StudentFee, StudentProfile,
};
use domain_reminders::{
    MockNotificationPort, MockReminderRulePort, NewReminderRule, NotificationPort, NotificationType,
    ReminderEngine, ReminderError, ReminderRule, RuleParams,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct World {
    institute: InstituteId,
    student: StudentProfile,
    batch: BatchProfile,
    fees: MockFeeLedgerPort,
    directory: MockDirectoryPort,
    rules: MockReminderRulePort,
    notifications: MockNotificationPort,
}

impl World {
    async fn new() -> Self {
        let institute = InstituteId::new();
        let student = StudentProfile {
            id: StudentId::new(),
            institute_id: institute,
            user_id: None,
            full_name: "Asha Verma".to_string(),
            email: Some("asha@example.com".to_string()),
        };
        let batch = BatchProfile {
            id: BatchId::new(),
            institute_id: institute,
            name: "NEET Morning".to_string(),
            course: Some("NEET".to_string()),
        };
        let directory = MockDirectoryPort::with_profiles(vec![student.clone()], vec![batch.clone()]).await;
        Self {
            institute,
            student,
            batch,
            fees: MockFeeLedgerPort::new(),
            directory,
            rules: MockReminderRulePort::new(),
            notifications: MockNotificationPort::new(),
        }
    }

    fn engine(&self) -> ReminderEngine {
        ReminderEngine::new(
            Arc::new(self.fees.clone()),
            Arc::new(self.directory.clone()),
            Arc::new(self.rules.clone()),
            Arc::new(self.notifications.clone()),
        )
    }

    async fn add_fee(&self, total: i64, schedule: &[(NaiveDate, i64)], paid: &[i64]) -> StudentFee {
        let mut fee = NewStudentFee {
            institute_id: self.institute,
            student_id: self.student.id,
            batch_id: self.batch.id,
            fee_plan_id: None,
            total_fee: Money::from_major(total),
            discount: Money::ZERO,
            due_schedule: DueSchedule::new(
                schedule
                    .iter()
                    .map(|(d, a)| Installment::new(*d, Money::from_major(*a)))
                    .collect(),
            ),
        }
        .into_student_fee(Utc::now());
        fee.payments = paid
            .iter()
            .map(|a| Payment {
                id: PaymentId::new(),
                institute_id: self.institute,
                student_fee_id: fee.id,
                amount: Money::from_major(*a),
                paid_on: date(2024, 1, 1),
                mode: PaymentMode::Cash,
                receipt_no: format!("RCPT-{}", PaymentId::new()),
                remarks: None,
                created_by: None,
                created_at: Utc::now(),
            })
            .collect();
        self.fees.insert(fee.clone()).await;
        fee
    }

    fn rule(&self, batch_id: Option<BatchId>, days_before: u32, on_due: bool, every: u32) -> ReminderRule {
        NewReminderRule {
            institute_id: self.institute,
            batch_id,
            name: format!("rule {days_before}/{on_due}/{every}"),
            params: RuleParams {
                days_before,
                on_due_date: on_due,
                every_n_days_after_due: every,
            },
            is_active: true,
        }
        .into_rule(Utc::now())
    }
}

// ============================================================================
// Trigger Scenarios
// ============================================================================

mod trigger_tests {
    use super::*;

    #[tokio::test]
    async fn test_before_due_fires_once_per_day() {
        let world = World::new().await;
        let rules = MockReminderRulePort::with_rules(vec![world.rule(None, 3, true, 3)]).await;
        let world = World { rules, ..world };
        world.add_fee(5000, &[(date(2024, 2, 1), 5000)], &[]).await;

        let engine = world.engine();
        let first = engine.run(date(2024, 1, 29), None).await.unwrap();
        assert_eq!(first.created, 1);

        let stored = world.notifications.all().await;
        assert_eq!(stored.len(), 1);
        let meta = stored[0].meta.as_ref().unwrap();
        assert_eq!(meta["trigger"], "before_due");
        assert_eq!(meta["trigger_day"], "2024-01-29");
        assert_eq!(meta["due_date"], "2024-02-01");
        assert_eq!(
            stored[0].message,
            "Fee reminder: Asha Verma, installment 1 for batch NEET Morning is due 2024-02-01. \
             Pending installment amount: INR 5000.00. Total pending: INR 5000.00."
        );

        let second = engine.run(date(2024, 1, 29), None).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.duplicates_skipped, 1);
        assert_eq!(world.notifications.count_of(NotificationType::FeeReminder).await, 1);
    }

    #[tokio::test]
    async fn test_fallback_rule_for_overdue_fee() {
        let world = World::new().await;
        world
            .add_fee(3000, &[(date(2024, 1, 1), 1000), (date(2024, 1, 4), 1000), (date(2024, 3, 1), 1000)], &[])
            .await;

        // 2024-01-07 is 6 days after the first and 3 days after the second installment
        let report = world.engine().run(date(2024, 1, 7), None).await.unwrap();
        assert_eq!(report.created, 2);

        let stored = world.notifications.all().await;
        let mut due_dates: Vec<String> = stored
            .iter()
            .map(|n| n.meta.as_ref().unwrap()["due_date"].as_str().unwrap().to_string())
            .collect();
        due_dates.sort();
        assert_eq!(due_dates, vec!["2024-01-01", "2024-01-04"]);
        assert!(stored.iter().all(|n| n.meta.as_ref().unwrap()["trigger"] == "after_due"));
    }

    #[tokio::test]
    async fn test_on_due_and_installment_index() {
        let world = World::new().await;
        world
            .add_fee(2000, &[(date(2024, 2, 1), 1000), (date(2024, 1, 1), 1000)], &[1000])
            .await;

        let report = world.engine().run_for_date_str("2024-02-01", None).await.unwrap();
        assert_eq!(report.created, 1);
        let stored = world.notifications.all().await;
        assert_eq!(stored[0].meta.as_ref().unwrap()["trigger"], "on_due");
        assert!(stored[0].message.contains("installment 2 for batch"));
        assert!(stored[0].whatsapp_template().contains("Amount due: INR 1000.00"));
    }

    #[tokio::test]
    async fn test_nothing_fires_between_triggers() {
        let world = World::new().await;
        world.add_fee(1000, &[(date(2024, 2, 1), 1000)], &[]).await;
        let report = world.engine().run(date(2024, 1, 20), None).await.unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.fees_scanned, 1);
    }
}

// ============================================================================
// Rule Resolution and Dedup
// ============================================================================

mod rule_tests {
    use super::*;

    #[tokio::test]
    async fn test_multiple_rules_collapse_to_one_reminder() {
        let world = World::new().await;
        let batch_id = world.batch.id;
        let rules = MockReminderRulePort::with_rules(vec![
            world.rule(None, 3, true, 3),
            world.rule(Some(batch_id), 3, false, 7),
        ])
        .await;
        let world = World { rules, ..world };
        world.add_fee(1000, &[(date(2024, 2, 1), 1000)], &[]).await;

        let report = world.engine().run(date(2024, 1, 29), None).await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.duplicates_skipped, 1);
    }

    #[tokio::test]
    async fn test_inactive_and_foreign_rules_fall_back() {
        let world = World::new().await;
        let mut inactive = world.rule(None, 10, false, 10);
        inactive.is_active = false;
        let other_batch = world.rule(Some(BatchId::new()), 10, false, 10);
        let rules = MockReminderRulePort::with_rules(vec![inactive, other_batch]).await;
        let world = World { rules, ..world };
        world.add_fee(1000, &[(date(2024, 2, 1), 1000)], &[]).await;

        // Only the default's three-days-before matches here
        let report = world.engine().run(date(2024, 1, 29), None).await.unwrap();
        assert_eq!(report.created, 1);
    }

    #[tokio::test]
    async fn test_next_day_is_a_new_key() {
        let world = World::new().await;
        let rules = MockReminderRulePort::with_rules(vec![world.rule(None, 0, false, 1)]).await;
        let world = World { rules, ..world };
        world.add_fee(1000, &[(date(2024, 1, 1), 1000)], &[]).await;

        let engine = world.engine();
        assert_eq!(engine.run(date(2024, 1, 2), None).await.unwrap().created, 1);
        assert_eq!(engine.run(date(2024, 1, 3), None).await.unwrap().created, 1);
        assert_eq!(engine.run(date(2024, 1, 3), None).await.unwrap().created, 0);
    }

    #[tokio::test]
    async fn test_prior_reminders_are_loaded_for_run_date_only() {
        let world = World::new().await;
        let rules = MockReminderRulePort::with_rules(vec![world.rule(None, 0, false, 1)]).await;
        let world = World { rules, ..world };
        world.add_fee(1000, &[(date(2024, 1, 1), 1000)], &[]).await;

        let engine = world.engine();
        for day in 2..=4 {
            engine.run(date(2024, 1, day), None).await.unwrap();
        }
        assert_eq!(world.notifications.count_of(NotificationType::FeeReminder).await, 3);

        let prior = world.notifications.prior_reminders(date(2024, 1, 3), None).await.unwrap();
        assert_eq!(prior.len(), 1);
        assert_eq!(prior[0].dedup_key().unwrap().run_date, date(2024, 1, 3));
        assert!(world
            .notifications
            .prior_reminders(date(2024, 1, 5), None)
            .await
            .unwrap()
            .is_empty());
        assert!(world
            .notifications
            .prior_reminders(date(2024, 1, 3), Some(InstituteId::new()))
            .await
            .unwrap()
            .is_empty());
    }
}

// ============================================================================
// Skips, Scope and Failures
// ============================================================================

mod run_tests {
    use super::*;

    #[tokio::test]
    async fn test_settled_fee_is_skipped() {
        let world = World::new().await;
        world.add_fee(1000, &[(date(2024, 1, 1), 1000)], &[1000]).await;
        let report = world.engine().run(date(2024, 1, 4), None).await.unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.settled_skipped, 1);
    }

    #[tokio::test]
    async fn test_unknown_student_is_skipped_without_aborting() {
        let world = World::new().await;
        world.add_fee(1000, &[(date(2024, 1, 1), 1000)], &[]).await;

        let orphan = NewStudentFee {
            institute_id: world.institute,
            student_id: StudentId::new(),
            batch_id: world.batch.id,
            fee_plan_id: None,
            total_fee: Money::from_major(500),
            discount: Money::ZERO,
            due_schedule: DueSchedule::new(vec![Installment::new(date(2024, 1, 1), Money::from_major(500))]),
        }
        .into_student_fee(Utc::now());
        world.fees.insert(orphan).await;

        let report = world.engine().run(date(2024, 1, 4), None).await.unwrap();
        assert_eq!(report.fees_scanned, 2);
        assert_eq!(report.unresolved_skipped, 1);
        assert_eq!(report.created, 1);
    }

    #[tokio::test]
    async fn test_scope_limits_run_to_one_institute() {
        let world = World::new().await;
        world.add_fee(1000, &[(date(2024, 1, 1), 1000)], &[]).await;

        let other = world.engine().run(date(2024, 1, 4), Some(InstituteId::new())).await.unwrap();
        assert_eq!(other.fees_scanned, 0);

        let own = world.engine().run(date(2024, 1, 4), Some(world.institute)).await.unwrap();
        assert_eq!(own.created, 1);
    }

    #[tokio::test]
    async fn test_invalid_run_date() {
        let world = World::new().await;
        let err = world.engine().run_for_date_str("04/01/2024", None).await.unwrap_err();
        assert!(matches!(err, ReminderError::InvalidRunDate(_)));
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_run() {
        let world = World::new().await;
        world.add_fee(1000, &[(date(2024, 1, 1), 1000)], &[]).await;
        world.notifications.fail_appends(true);

        let err = world.engine().run(date(2024, 1, 4), None).await.unwrap_err();
        assert!(matches!(err, ReminderError::Port(e) if e.is_transient()));
    }
}
