//! Reminder run engine
//!
//! One run evaluates every unsettled fee in scope against the effective
//! rules for its batch and records at most one reminder per student, fee,
//! installment and run day. Runs are sequential and may be repeated for
//! the same day without creating duplicates.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use core_kernel::{days_between, parse_iso_date, BatchId, InstituteId, StudentId};
use domain_fees::{BatchProfile, DirectoryPort, FeeLedgerPort, FeeQuery, StudentFee, StudentProfile};

use crate::error::ReminderError;
use crate::message::{reminder_message, whatsapp_template};
use crate::notification::{AppendOutcome, DedupKey, NewNotification, ReminderMeta};
use crate::ports::{NotificationPort, ReminderRulePort};
use crate::rule::{effective_rules, ReminderRule};
use crate::trigger::Trigger;

/// Outcome of one reminder run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderRunReport {
    pub run_date: Option<NaiveDate>,
    /// Notifications actually stored by this run
    pub created: usize,
    pub fees_scanned: usize,
    pub settled_skipped: usize,
    /// Fees whose student or batch could not be found
    pub unresolved_skipped: usize,
    /// Matches suppressed because an equivalent reminder exists
    pub duplicates_skipped: usize,
}

/// Runs reminder evaluation over the fee ledger
#[derive(Clone)]
pub struct ReminderEngine {
    fees: Arc<dyn FeeLedgerPort>,
    directory: Arc<dyn DirectoryPort>,
    rules: Arc<dyn ReminderRulePort>,
    notifications: Arc<dyn NotificationPort>,
}

/// Per-run cache of directory lookups
#[derive(Default)]
struct Profiles {
    students: HashMap<StudentId, Option<StudentProfile>>,
    batches: HashMap<BatchId, Option<BatchProfile>>,
}

impl ReminderEngine {
    pub fn new(
        fees: Arc<dyn FeeLedgerPort>,
        directory: Arc<dyn DirectoryPort>,
        rules: Arc<dyn ReminderRulePort>,
        notifications: Arc<dyn NotificationPort>,
    ) -> Self {
        Self {
            fees,
            directory,
            rules,
            notifications,
        }
    }

    /// Parses `YYYY-MM-DD` and runs for that day
    pub async fn run_for_date_str(
        &self,
        run_date: &str,
        scope: Option<InstituteId>,
    ) -> Result<ReminderRunReport, ReminderError> {
        let date = parse_iso_date(run_date).map_err(|_| ReminderError::InvalidRunDate(run_date.to_string()))?;
        self.run(date, scope).await
    }

    /// Evaluates all fees in scope for `run_date`
    ///
    /// `scope` limits the run to one institute; `None` covers all of them.
    /// Any storage failure aborts the run.
    #[instrument(skip(self), fields(run_date = %run_date))]
    pub async fn run(
        &self,
        run_date: NaiveDate,
        scope: Option<InstituteId>,
    ) -> Result<ReminderRunReport, ReminderError> {
        let rules = self.rules.list_active(scope).await?;
        let mut seen: HashSet<DedupKey> = self
            .notifications
            .prior_reminders(run_date, scope)
            .await?
            .iter()
            .filter_map(|p| p.dedup_key())
            .collect();
        let fees = self
            .fees
            .list_student_fees(FeeQuery {
                institute_id: scope,
                ..Default::default()
            })
            .await?;

        debug!(
            rules = rules.len(),
            prior = seen.len(),
            fees = fees.len(),
            "loaded reminder run inputs"
        );

        let mut report = ReminderRunReport {
            run_date: Some(run_date),
            ..Default::default()
        };
        let mut profiles = Profiles::default();

        for fee in &fees {
            report.fees_scanned += 1;
            self.process_fee(fee, run_date, &rules, &mut seen, &mut profiles, &mut report)
                .await?;
        }

        info!(
            created = report.created,
            fees_scanned = report.fees_scanned,
            settled_skipped = report.settled_skipped,
            unresolved_skipped = report.unresolved_skipped,
            duplicates_skipped = report.duplicates_skipped,
            "fee reminder run complete"
        );
        Ok(report)
    }

    async fn process_fee(
        &self,
        fee: &StudentFee,
        run_date: NaiveDate,
        rules: &[ReminderRule],
        seen: &mut HashSet<DedupKey>,
        profiles: &mut Profiles,
        report: &mut ReminderRunReport,
    ) -> Result<(), ReminderError> {
        let ledger = fee.ledger();
        let total_due = ledger.amount_due();
        if !total_due.is_positive() {
            report.settled_skipped += 1;
            return Ok(());
        }

        let (Some(student), Some(batch)) = (
            self.student(fee.student_id, profiles).await?,
            self.batch(fee.batch_id, profiles).await?,
        ) else {
            warn!(
                student_fee_id = %fee.id,
                student_id = %fee.student_id,
                batch_id = %fee.batch_id,
                "skipping fee with unknown student or batch"
            );
            report.unresolved_skipped += 1;
            return Ok(());
        };

        let sources = effective_rules(rules, fee.institute_id, fee.batch_id);

        for installment in ledger.outstanding_installments() {
            let delta_days = days_between(run_date, installment.due_date);
            for source in &sources {
                let Some(trigger) = Trigger::evaluate(delta_days, &source.params()) else {
                    continue;
                };

                let key = DedupKey {
                    student_id: student.id,
                    student_fee_id: fee.id,
                    due_date: installment.due_date,
                    run_date,
                };
                if seen.contains(&key) {
                    report.duplicates_skipped += 1;
                    continue;
                }

                let meta = ReminderMeta {
                    student_fee_id: fee.id,
                    batch_id: fee.batch_id,
                    due_date: installment.due_date,
                    trigger,
                    trigger_day: run_date,
                    whatsapp_template: whatsapp_template(
                        &student.full_name,
                        &batch.name,
                        installment.amount,
                        installment.due_date,
                    ),
                };
                let message = reminder_message(
                    &student.full_name,
                    installment.index,
                    &batch.name,
                    installment.due_date,
                    installment.amount,
                    total_due,
                );

                let outcome = self
                    .notifications
                    .append(NewNotification::fee_reminder(fee.institute_id, student.id, message, &meta))
                    .await?;
                seen.insert(key);
                match outcome {
                    AppendOutcome::Inserted(notification) => {
                        debug!(
                            notification_id = %notification.id,
                            student_fee_id = %fee.id,
                            trigger = %trigger,
                            fallback_rule = source.is_fallback(),
                            "fee reminder recorded"
                        );
                        report.created += 1;
                    }
                    AppendOutcome::Duplicate => report.duplicates_skipped += 1,
                }
            }
        }
        Ok(())
    }

    async fn student(
        &self,
        id: StudentId,
        profiles: &mut Profiles,
    ) -> Result<Option<StudentProfile>, ReminderError> {
        if let Some(cached) = profiles.students.get(&id) {
            return Ok(cached.clone());
        }
        let found = self.directory.find_student(id).await?;
        profiles.students.insert(id, found.clone());
        Ok(found)
    }

    async fn batch(
        &self,
        id: BatchId,
        profiles: &mut Profiles,
    ) -> Result<Option<BatchProfile>, ReminderError> {
        if let Some(cached) = profiles.batches.get(&id) {
            return Ok(cached.clone());
        }
        let found = self.directory.find_batch(id).await?;
        profiles.batches.insert(id, found.clone());
        Ok(found)
    }
}
