//! Dues reporting
//!
//! The dues list and the fee dashboard are both derived from the ledger of
//! each fee. Neither computes balances on its own.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use core_kernel::{BatchId, Money, StudentFeeId, StudentId};

use crate::directory::{BatchProfile, StudentProfile};
use crate::student_fee::StudentFee;

/// Maximum number of entries in the dashboard's upcoming list
pub const UPCOMING_DUES_LIMIT: usize = 10;

/// Display names for the students and batches of an institute
///
/// Unknown ids resolve to an empty name.
#[derive(Debug, Clone, Default)]
pub struct DirectoryNames {
    students: HashMap<StudentId, String>,
    batches: HashMap<BatchId, String>,
}

impl DirectoryNames {
    pub fn new(students: &[StudentProfile], batches: &[BatchProfile]) -> Self {
        Self {
            students: students.iter().map(|s| (s.id, s.full_name.clone())).collect(),
            batches: batches.iter().map(|b| (b.id, b.name.clone())).collect(),
        }
    }

    pub fn student_name(&self, id: StudentId) -> &str {
        self.students.get(&id).map(String::as_str).unwrap_or("")
    }

    pub fn batch_name(&self, id: BatchId) -> &str {
        self.batches.get(&id).map(String::as_str).unwrap_or("")
    }
}

/// Filters for the dues list
#[derive(Debug, Clone, Default)]
pub struct DueFilter {
    pub batch_id: Option<BatchId>,
    pub student_id: Option<StudentId>,
    /// Excludes fees whose next due date is earlier
    pub due_from: Option<NaiveDate>,
    /// Excludes fees whose next due date is later
    pub due_to: Option<NaiveDate>,
}

impl DueFilter {
    fn matches_fee(&self, fee: &StudentFee) -> bool {
        self.batch_id.map_or(true, |b| fee.batch_id == b)
            && self.student_id.map_or(true, |s| fee.student_id == s)
    }

    // Date bounds only apply when a next due date exists
    fn matches_next_due(&self, next_due: Option<NaiveDate>) -> bool {
        let Some(date) = next_due else {
            return true;
        };
        self.due_from.map_or(true, |from| date >= from) && self.due_to.map_or(true, |to| date <= to)
    }
}

/// One row of the dues list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueItem {
    pub student_fee_id: StudentFeeId,
    pub student_id: StudentId,
    pub student_name: String,
    pub batch_id: BatchId,
    pub batch_name: String,
    pub total_fee: Money,
    pub discount: Money,
    pub paid_amount: Money,
    pub due_amount: Money,
    pub next_due_date: Option<NaiveDate>,
    pub upcoming_due_amount: Option<Money>,
}

impl DueItem {
    /// Builds the dues list for fees that still have something owed
    pub fn report<'a, I>(fees: I, filter: &DueFilter, names: &DirectoryNames) -> Vec<DueItem>
    where
        I: IntoIterator<Item = &'a StudentFee>,
    {
        fees.into_iter()
            .filter(|fee| filter.matches_fee(fee))
            .filter_map(|fee| {
                let ledger = fee.ledger();
                let due_amount = ledger.amount_due();
                if !due_amount.is_positive() {
                    return None;
                }
                let next = ledger.next_due_installment();
                let next_due_date = next.map(|n| n.due_date);
                if !filter.matches_next_due(next_due_date) {
                    return None;
                }
                Some(DueItem {
                    student_fee_id: fee.id,
                    student_id: fee.student_id,
                    student_name: names.student_name(fee.student_id).to_string(),
                    batch_id: fee.batch_id,
                    batch_name: names.batch_name(fee.batch_id).to_string(),
                    total_fee: fee.total_fee,
                    discount: fee.discount,
                    paid_amount: ledger.amount_paid(),
                    due_amount,
                    next_due_date,
                    upcoming_due_amount: next.map(|n| n.outstanding_amount),
                })
            })
            .collect()
    }
}

/// An entry of the dashboard's upcoming dues
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingDue {
    pub student_fee_id: StudentFeeId,
    pub student_name: String,
    pub batch_name: String,
    pub next_due_date: Option<NaiveDate>,
    /// Next installment's outstanding amount, or the whole due without a schedule
    pub due_amount: Money,
}

/// Fee totals for an institute dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    /// Number of fee records with a positive amount due
    pub unpaid_students: usize,
    pub total_due_amount: Money,
    pub upcoming_dues: Vec<UpcomingDue>,
}

impl DashboardSummary {
    pub fn from_fees<'a, I>(fees: I, names: &DirectoryNames) -> Self
    where
        I: IntoIterator<Item = &'a StudentFee>,
    {
        let mut unpaid_students = 0;
        let mut total_due_amount = Money::ZERO;
        let mut upcoming_dues = Vec::new();

        for fee in fees {
            let ledger = fee.ledger();
            let due = ledger.amount_due();
            if !due.is_positive() {
                continue;
            }
            unpaid_students += 1;
            total_due_amount += due;
            if upcoming_dues.len() < UPCOMING_DUES_LIMIT {
                let next = ledger.next_due_installment();
                upcoming_dues.push(UpcomingDue {
                    student_fee_id: fee.id,
                    student_name: names.student_name(fee.student_id).to_string(),
                    batch_name: names.batch_name(fee.batch_id).to_string(),
                    next_due_date: next.map(|n| n.due_date),
                    due_amount: next.map_or(due, |n| n.outstanding_amount),
                });
            }
        }

        Self {
            unpaid_students,
            total_due_amount,
            upcoming_dues,
        }
    }
}
