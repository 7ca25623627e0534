//! Fee Reminder Domain
//!
//! Decides which students are reminded about which installments on a given
//! day, renders the reminder text and records it as a notification.
//!
//! # Rule Evaluation
//!
//! For every outstanding installment of every unsettled fee, each effective
//! rule is checked against `delta_days = due_date - run_date`:
//!
//! - `delta_days == days_before` fires `before_due`
//! - `delta_days == 0` with `on_due_date` fires `on_due`
//! - overdue by a multiple of `every_n_days_after_due` fires `after_due`
//!
//! Batch-scoped and institute-wide rules both apply to a fee. When an
//! institute has no matching active rule, a built-in default of three days
//! before, on the due date, and every three days after is used.
//!
//! # Deduplication
//!
//! At most one reminder is recorded per student, fee, installment due date
//! and run day, no matter how many rules fire or how often a run repeats.

pub mod rule;
pub mod trigger;
pub mod message;
pub mod notification;
pub mod engine;
pub mod error;
pub mod ports;

pub use rule::{ReminderRule, NewReminderRule, ReminderRuleUpdate, RuleParams, RuleSource, ImplicitDefault, effective_rules};
pub use trigger::Trigger;
pub use notification::{
    Notification, NewNotification, NotificationType, ReminderMeta, DedupKey,
    AppendOutcome, PriorReminder, NotificationQuery, StudentAudience,
};
pub use engine::{ReminderEngine, ReminderRunReport};
pub use error::ReminderError;
pub use ports::{ReminderRulePort, NotificationPort};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockReminderRulePort, MockNotificationPort};
