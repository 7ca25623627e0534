//! Reminder rules and rule resolution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BatchId, InstituteId, ReminderRuleId};

use crate::error::ReminderError;

/// Largest accepted value for day counts on a rule
pub const MAX_RULE_DAYS: u32 = 60;

/// The scheduling fields shared by configured rules and the default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleParams {
    /// Days before the due date to send a reminder
    pub days_before: u32,
    /// Whether to send a reminder on the due date
    pub on_due_date: bool,
    /// Repeat interval once overdue
    pub every_n_days_after_due: u32,
}

/// A configured reminder rule
///
/// A rule without a batch applies to every batch of its institute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRule {
    pub id: ReminderRuleId,
    pub institute_id: InstituteId,
    pub batch_id: Option<BatchId>,
    pub name: String,
    pub days_before: u32,
    pub on_due_date: bool,
    pub every_n_days_after_due: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReminderRule {
    pub fn params(&self) -> RuleParams {
        RuleParams {
            days_before: self.days_before,
            on_due_date: self.on_due_date,
            every_n_days_after_due: self.every_n_days_after_due,
        }
    }

    /// Returns true if this rule is active and covers the institute and batch
    pub fn applies_to(&self, institute_id: InstituteId, batch_id: BatchId) -> bool {
        self.is_active
            && self.institute_id == institute_id
            && self.batch_id.map_or(true, |b| b == batch_id)
    }
}

/// The rule used when an institute has none configured for a fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImplicitDefault;

impl ImplicitDefault {
    pub const PARAMS: RuleParams = RuleParams {
        days_before: 3,
        on_due_date: true,
        every_n_days_after_due: 3,
    };
}

/// Where an effective rule came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Configured(ReminderRule),
    Fallback(ImplicitDefault),
}

impl RuleSource {
    pub fn params(&self) -> RuleParams {
        match self {
            RuleSource::Configured(rule) => rule.params(),
            RuleSource::Fallback(_) => ImplicitDefault::PARAMS,
        }
    }

    pub fn rule_id(&self) -> Option<ReminderRuleId> {
        match self {
            RuleSource::Configured(rule) => Some(rule.id),
            RuleSource::Fallback(_) => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RuleSource::Fallback(_))
    }
}

/// Rules that apply to a fee of `institute_id` in `batch_id`
///
/// Batch-scoped and institute-wide rules both apply, in the order given.
/// Falls back to [`ImplicitDefault`] when nothing matches.
pub fn effective_rules(rules: &[ReminderRule], institute_id: InstituteId, batch_id: BatchId) -> Vec<RuleSource> {
    let matching: Vec<RuleSource> = rules
        .iter()
        .filter(|r| r.applies_to(institute_id, batch_id))
        .cloned()
        .map(RuleSource::Configured)
        .collect();
    if matching.is_empty() {
        vec![RuleSource::Fallback(ImplicitDefault)]
    } else {
        matching
    }
}

fn validate_name(name: &str) -> Result<(), ReminderError> {
    let len = name.trim().chars().count();
    if !(2..=150).contains(&len) {
        return Err(ReminderError::InvalidRule(
            "name must be between 2 and 150 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_params(params: &RuleParams) -> Result<(), ReminderError> {
    if params.days_before > MAX_RULE_DAYS {
        return Err(ReminderError::InvalidRule(format!(
            "days_before must be at most {MAX_RULE_DAYS}"
        )));
    }
    if !(1..=MAX_RULE_DAYS).contains(&params.every_n_days_after_due) {
        return Err(ReminderError::InvalidRule(format!(
            "every_n_days_after_due must be between 1 and {MAX_RULE_DAYS}"
        )));
    }
    Ok(())
}

/// A rule about to be created
#[derive(Debug, Clone)]
pub struct NewReminderRule {
    pub institute_id: InstituteId,
    pub batch_id: Option<BatchId>,
    pub name: String,
    pub params: RuleParams,
    pub is_active: bool,
}

impl NewReminderRule {
    pub fn validate(&self) -> Result<(), ReminderError> {
        validate_name(&self.name)?;
        validate_params(&self.params)
    }

    pub fn into_rule(self, now: DateTime<Utc>) -> ReminderRule {
        ReminderRule {
            id: ReminderRuleId::new_v7(),
            institute_id: self.institute_id,
            batch_id: self.batch_id,
            name: self.name.trim().to_string(),
            days_before: self.params.days_before,
            on_due_date: self.params.on_due_date,
            every_n_days_after_due: self.params.every_n_days_after_due,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct ReminderRuleUpdate {
    pub name: Option<String>,
    pub days_before: Option<u32>,
    pub on_due_date: Option<bool>,
    pub every_n_days_after_due: Option<u32>,
    pub is_active: Option<bool>,
}

impl ReminderRuleUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.days_before.is_none()
            && self.on_due_date.is_none()
            && self.every_n_days_after_due.is_none()
            && self.is_active.is_none()
    }

    /// Applies the update to a copy of `rule` and validates the result
    pub fn apply(&self, rule: &ReminderRule, now: DateTime<Utc>) -> Result<ReminderRule, ReminderError> {
        let mut updated = rule.clone();
        if let Some(name) = &self.name {
            validate_name(name)?;
            updated.name = name.trim().to_string();
        }
        if let Some(days_before) = self.days_before {
            updated.days_before = days_before;
        }
        if let Some(on_due_date) = self.on_due_date {
            updated.on_due_date = on_due_date;
        }
        if let Some(every) = self.every_n_days_after_due {
            updated.every_n_days_after_due = every;
        }
        if let Some(is_active) = self.is_active {
            updated.is_active = is_active;
        }
        validate_params(&updated.params())?;
        if !self.is_empty() {
            updated.updated_at = now;
        }
        Ok(updated)
    }
}
