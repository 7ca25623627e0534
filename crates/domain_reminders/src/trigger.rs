//! Trigger evaluation for a single rule and installment

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rule::RuleParams;

/// Why a reminder fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    BeforeDue,
    OnDue,
    AfterDue,
}

impl Trigger {
    /// Selects the trigger for an installment due `delta_days` after the run day
    ///
    /// Checks are ordered and the first match wins, so a rule with
    /// `days_before == 0` reports `before_due` on the due date itself.
    pub fn evaluate(delta_days: i64, params: &RuleParams) -> Option<Trigger> {
        if delta_days == i64::from(params.days_before) {
            return Some(Trigger::BeforeDue);
        }
        if delta_days == 0 && params.on_due_date {
            return Some(Trigger::OnDue);
        }
        if delta_days < 0 {
            let every = i64::from(params.every_n_days_after_due.max(1));
            if delta_days.abs() % every == 0 {
                return Some(Trigger::AfterDue);
            }
        }
        None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::BeforeDue => "before_due",
            Trigger::OnDue => "on_due",
            Trigger::AfterDue => "after_due",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
