//! Reminder rule DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_reminders::{ReminderRuleUpdate, RuleParams};

fn default_days_before() -> u32 {
    3
}

fn default_every_n_days() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReminderRuleRequest {
    #[validate(length(min = 2, max = 150))]
    pub name: String,
    pub batch_id: Option<Uuid>,
    #[serde(default = "default_days_before")]
    #[validate(range(max = 60))]
    pub days_before: u32,
    #[serde(default = "default_true")]
    pub on_due_date: bool,
    #[serde(default = "default_every_n_days")]
    #[validate(range(min = 1, max = 60))]
    pub every_n_days_after_due: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CreateReminderRuleRequest {
    pub fn params(&self) -> RuleParams {
        RuleParams {
            days_before: self.days_before,
            on_due_date: self.on_due_date,
            every_n_days_after_due: self.every_n_days_after_due,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateReminderRuleRequest {
    #[validate(length(min = 2, max = 150))]
    pub name: Option<String>,
    #[validate(range(max = 60))]
    pub days_before: Option<u32>,
    pub on_due_date: Option<bool>,
    #[validate(range(min = 1, max = 60))]
    pub every_n_days_after_due: Option<u32>,
    pub is_active: Option<bool>,
}

impl From<UpdateReminderRuleRequest> for ReminderRuleUpdate {
    fn from(req: UpdateReminderRuleRequest) -> Self {
        ReminderRuleUpdate {
            name: req.name,
            days_before: req.days_before,
            on_due_date: req.on_due_date,
            every_n_days_after_due: req.every_n_days_after_due,
            is_active: req.is_active,
        }
    }
}

/// Optional `run_date=YYYY-MM-DD`; defaults to today in the configured zone
#[derive(Debug, Default, Deserialize)]
pub struct RunRemindersQuery {
    pub run_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunRemindersResponse {
    pub created_notifications: usize,
    pub run_date: Option<chrono::NaiveDate>,
    pub fees_scanned: usize,
    pub duplicates_skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_defaults() {
        let req: CreateReminderRuleRequest = serde_json::from_value(json!({"name": "Default"})).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(
            req.params(),
            RuleParams { days_before: 3, on_due_date: true, every_n_days_after_due: 3 }
        );
        assert!(req.is_active);
    }

    #[test]
    fn test_create_out_of_range() {
        let req: CreateReminderRuleRequest =
            serde_json::from_value(json!({"name": "x", "days_before": 61, "every_n_days_after_due": 0})).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("days_before"));
        assert!(fields.contains_key("every_n_days_after_due"));
    }

    #[test]
    fn test_update_maps_fields() {
        let req: UpdateReminderRuleRequest = serde_json::from_value(json!({"is_active": false})).unwrap();
        assert!(req.validate().is_ok());
        let update = ReminderRuleUpdate::from(req);
        assert_eq!(update.is_active, Some(false));
        assert!(update.name.is_none());
    }
}
