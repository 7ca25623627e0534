//! In-memory port harness
//!
//! One institute with one enrolled student in one batch, backed by the mock
//! ports, plus a reminder engine wired over them.

use std::sync::Arc;

use core_kernel::InstituteId;
use domain_fees::{BatchProfile, MockDirectoryPort, MockFeeLedgerPort, StudentFee, StudentProfile};
use domain_reminders::{MockNotificationPort, MockReminderRulePort, ReminderEngine, ReminderRule};

use crate::builders::{batch_profile, student_profile, StudentFeeBuilder};

#[derive(Clone)]
pub struct InMemoryPorts {
    pub institute_id: InstituteId,
    pub student: StudentProfile,
    pub batch: BatchProfile,
    pub fees: MockFeeLedgerPort,
    pub directory: MockDirectoryPort,
    pub rules: MockReminderRulePort,
    pub notifications: MockNotificationPort,
}

impl InMemoryPorts {
    pub async fn new() -> Self {
        let institute_id = InstituteId::new();
        let student = student_profile(institute_id, "Asha Verma");
        let batch = batch_profile(institute_id, "NEET Morning");

        let directory = MockDirectoryPort::with_profiles(vec![student.clone()], vec![batch.clone()]).await;
        directory.enroll(student.id, batch.id).await;

        Self {
            institute_id,
            student,
            batch,
            fees: MockFeeLedgerPort::new(),
            directory,
            rules: MockReminderRulePort::new(),
            notifications: MockNotificationPort::new(),
        }
    }

    /// Same ports with a preset rule list
    pub async fn with_rules(mut self, rules: Vec<ReminderRule>) -> Self {
        self.rules = MockReminderRulePort::with_rules(rules).await;
        self
    }

    /// A fee builder bound to this institute, student and batch
    pub fn fee(&self) -> StudentFeeBuilder {
        StudentFeeBuilder::new()
            .institute(self.institute_id)
            .student(self.student.id)
            .batch(self.batch.id)
    }

    /// Stores a built fee and returns it
    pub async fn add_fee(&self, builder: StudentFeeBuilder) -> StudentFee {
        let fee = builder.build();
        self.fees.insert(fee.clone()).await;
        fee
    }

    pub fn engine(&self) -> ReminderEngine {
        ReminderEngine::new(
            Arc::new(self.fees.clone()),
            Arc::new(self.directory.clone()),
            Arc::new(self.rules.clone()),
            Arc::new(self.notifications.clone()),
        )
    }
}
