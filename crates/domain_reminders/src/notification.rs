//! Notifications and reminder metadata
//!
//! Notifications are created once and afterwards only marked read. Fee
//! reminders carry structured metadata that doubles as their dedup key.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use core_kernel::{BatchId, InstituteId, NotificationId, PageRequest, StudentFeeId, StudentId};

use crate::trigger::Trigger;

/// Kind of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    FeeReminder,
    Announcement,
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::FeeReminder => "FEE_REMINDER",
            NotificationType::Announcement => "ANNOUNCEMENT",
            NotificationType::System => "SYSTEM",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FEE_REMINDER" => Ok(NotificationType::FeeReminder),
            "ANNOUNCEMENT" => Ok(NotificationType::Announcement),
            "SYSTEM" => Ok(NotificationType::System),
            other => Err(format!("unknown notification type: {other}")),
        }
    }
}

/// Metadata attached to every fee reminder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderMeta {
    pub student_fee_id: StudentFeeId,
    pub batch_id: BatchId,
    /// Due date of the installment being reminded about
    pub due_date: NaiveDate,
    pub trigger: Trigger,
    /// Run day that produced the reminder
    pub trigger_day: NaiveDate,
    pub whatsapp_template: String,
}

impl ReminderMeta {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Identity of a reminder for deduplication
///
/// Trigger kind and rule are deliberately absent: two rules firing for the
/// same installment on the same day produce one reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub student_id: StudentId,
    pub student_fee_id: StudentFeeId,
    pub due_date: NaiveDate,
    pub run_date: NaiveDate,
}

#[derive(Deserialize)]
struct KeyFields {
    student_fee_id: StudentFeeId,
    due_date: NaiveDate,
    trigger_day: NaiveDate,
}

impl DedupKey {
    /// Rebuilds the key of a stored reminder
    ///
    /// Returns `None` when the student is missing or the metadata lacks the
    /// key fields; such rows never block a new reminder.
    pub fn from_stored(student_id: Option<StudentId>, meta: Option<&Value>) -> Option<Self> {
        let student_id = student_id?;
        let fields: KeyFields = serde_json::from_value(meta?.clone()).ok()?;
        Some(Self {
            student_id,
            student_fee_id: fields.student_fee_id,
            due_date: fields.due_date,
            run_date: fields.trigger_day,
        })
    }
}

/// A stored notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub institute_id: InstituteId,
    pub student_id: Option<StudentId>,
    pub batch_id: Option<BatchId>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub meta: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// WhatsApp text from the metadata, or the message itself
    pub fn whatsapp_template(&self) -> String {
        self.meta
            .as_ref()
            .and_then(|m| m.get("whatsapp_template"))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.message.clone())
    }

    pub fn dedup_key(&self) -> Option<DedupKey> {
        if self.notification_type != NotificationType::FeeReminder {
            return None;
        }
        DedupKey::from_stored(self.student_id, self.meta.as_ref())
    }

    /// Whether a student may see this notification
    ///
    /// Students see their own notifications, institute-wide ones, and those
    /// addressed to a batch they are enrolled in.
    pub fn visible_to(&self, audience: &StudentAudience) -> bool {
        match (self.student_id, self.batch_id) {
            (Some(student_id), _) => student_id == audience.student_id,
            (None, None) => true,
            (None, Some(batch_id)) => audience.batch_ids.contains(&batch_id),
        }
    }
}

/// A notification about to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub institute_id: InstituteId,
    pub student_id: Option<StudentId>,
    pub batch_id: Option<BatchId>,
    pub notification_type: NotificationType,
    pub message: String,
    pub meta: Option<Value>,
}

impl NewNotification {
    /// A fee reminder addressed to one student
    pub fn fee_reminder(
        institute_id: InstituteId,
        student_id: StudentId,
        message: String,
        meta: &ReminderMeta,
    ) -> Self {
        Self {
            institute_id,
            student_id: Some(student_id),
            batch_id: Some(meta.batch_id),
            notification_type: NotificationType::FeeReminder,
            message,
            meta: Some(meta.to_value()),
        }
    }

    pub fn dedup_key(&self) -> Option<DedupKey> {
        if self.notification_type != NotificationType::FeeReminder {
            return None;
        }
        DedupKey::from_stored(self.student_id, self.meta.as_ref())
    }

    pub fn into_notification(self, now: DateTime<Utc>) -> Notification {
        Notification {
            id: NotificationId::new_v7(),
            institute_id: self.institute_id,
            student_id: self.student_id,
            batch_id: self.batch_id,
            notification_type: self.notification_type,
            message: self.message,
            meta: self.meta,
            created_at: now,
            read_at: None,
        }
    }
}

/// Result of appending a notification
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    Inserted(Notification),
    /// A reminder with the same dedup key already exists
    Duplicate,
}

impl AppendOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, AppendOutcome::Inserted(_))
    }
}

/// The parts of a stored fee reminder needed to rebuild its dedup key
#[derive(Debug, Clone, PartialEq)]
pub struct PriorReminder {
    pub student_id: Option<StudentId>,
    pub meta: Option<Value>,
}

impl PriorReminder {
    pub fn dedup_key(&self) -> Option<DedupKey> {
        DedupKey::from_stored(self.student_id, self.meta.as_ref())
    }
}

/// A student and the batches they belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentAudience {
    pub student_id: StudentId,
    pub batch_ids: Vec<BatchId>,
}

/// Filters for listing notifications, newest first
#[derive(Debug, Clone)]
pub struct NotificationQuery {
    pub institute_id: InstituteId,
    pub notification_type: Option<NotificationType>,
    /// Restricts to what this student may see
    pub audience: Option<StudentAudience>,
    pub page: PageRequest,
}

impl NotificationQuery {
    pub fn matches(&self, notification: &Notification) -> bool {
        notification.institute_id == self.institute_id
            && self
                .notification_type
                .map_or(true, |t| notification.notification_type == t)
            && self
                .audience
                .as_ref()
                .map_or(true, |a| notification.visible_to(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta() -> ReminderMeta {
        ReminderMeta {
            student_fee_id: StudentFeeId::new(),
            batch_id: BatchId::new(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            trigger: Trigger::BeforeDue,
            trigger_day: NaiveDate::from_ymd_opt(2024, 1, 29).unwrap(),
            whatsapp_template: "Hello".to_string(),
        }
    }

    #[test]
    fn test_meta_keys() {
        let value = meta().to_value();
        for key in ["student_fee_id", "batch_id", "due_date", "trigger", "trigger_day", "whatsapp_template"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["trigger"], json!("before_due"));
        assert_eq!(value["due_date"], json!("2024-02-01"));
    }

    #[test]
    fn test_dedup_key_round_trip() {
        let m = meta();
        let student = StudentId::new();
        let reminder = NewNotification::fee_reminder(InstituteId::new(), student, "text".to_string(), &m);
        let key = reminder.dedup_key().unwrap();
        assert_eq!(key.student_id, student);
        assert_eq!(key.student_fee_id, m.student_fee_id);
        assert_eq!(key.run_date, m.trigger_day);
    }

    #[test]
    fn test_dedup_key_ignores_incomplete_meta() {
        assert!(DedupKey::from_stored(Some(StudentId::new()), Some(&json!({"due_date": "2024-02-01"}))).is_none());
        assert!(DedupKey::from_stored(Some(StudentId::new()), None).is_none());
        assert!(DedupKey::from_stored(None, Some(&meta().to_value())).is_none());
    }

    #[test]
    fn test_whatsapp_falls_back_to_message() {
        let mut n = NewNotification {
            institute_id: InstituteId::new(),
            student_id: None,
            batch_id: None,
            notification_type: NotificationType::Announcement,
            message: "Holiday on Friday".to_string(),
            meta: None,
        }
        .into_notification(Utc::now());
        assert_eq!(n.whatsapp_template(), "Holiday on Friday");
        n.meta = Some(json!({"whatsapp_template": "Hi"}));
        assert_eq!(n.whatsapp_template(), "Hi");
    }

    #[test]
    fn test_student_visibility() {
        let me = StudentId::new();
        let my_batch = BatchId::new();
        let audience = StudentAudience { student_id: me, batch_ids: vec![my_batch] };
        let base = NewNotification {
            institute_id: InstituteId::new(),
            student_id: None,
            batch_id: None,
            notification_type: NotificationType::Announcement,
            message: "m".to_string(),
            meta: None,
        };

        let everyone = base.clone().into_notification(Utc::now());
        let my_class = NewNotification { batch_id: Some(my_batch), ..base.clone() }.into_notification(Utc::now());
        let other_class = NewNotification { batch_id: Some(BatchId::new()), ..base.clone() }.into_notification(Utc::now());
        let someone_else = NewNotification { student_id: Some(StudentId::new()), ..base.clone() }.into_notification(Utc::now());
        let mine = NewNotification { student_id: Some(me), batch_id: Some(BatchId::new()), ..base }.into_notification(Utc::now());

        assert!(everyone.visible_to(&audience));
        assert!(my_class.visible_to(&audience));
        assert!(!other_class.visible_to(&audience));
        assert!(!someone_else.visible_to(&audience));
        assert!(mine.visible_to(&audience));
    }

    #[test]
    fn test_type_parsing() {
        assert_eq!("FEE_REMINDER".parse::<NotificationType>().unwrap(), NotificationType::FeeReminder);
        assert!("fee_reminder".parse::<NotificationType>().is_err());
    }
}
