//! Payments recorded against a student fee
//!
//! Payments are immutable once recorded. They are never tied to a specific
//! installment; the ledger applies them in due-date order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{InstituteId, Money, PaymentId, StudentFeeId, UserId};

use crate::error::FeeError;

/// How a payment was received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMode {
    Cash,
    Upi,
    Bank,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "CASH",
            PaymentMode::Upi => "UPI",
            PaymentMode::Bank => "BANK",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(PaymentMode::Cash),
            "UPI" => Ok(PaymentMode::Upi),
            "BANK" => Ok(PaymentMode::Bank),
            _ => Err(FeeError::InvalidPaymentMode(s.to_string())),
        }
    }
}

/// A recorded payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub institute_id: InstituteId,
    pub student_fee_id: StudentFeeId,
    pub amount: Money,
    /// Date the money was received
    pub paid_on: NaiveDate,
    pub mode: PaymentMode,
    /// Unique human-facing receipt number
    pub receipt_no: String,
    pub remarks: Option<String>,
    /// User who recorded the payment
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// A payment about to be recorded
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub institute_id: InstituteId,
    pub student_fee_id: StudentFeeId,
    pub amount: Money,
    pub paid_on: NaiveDate,
    pub mode: PaymentMode,
    pub remarks: Option<String>,
    pub created_by: Option<UserId>,
}

impl NewPayment {
    /// Assigns an id, a receipt number and a creation timestamp
    pub fn into_payment(self, now: DateTime<Utc>) -> Payment {
        Payment {
            id: PaymentId::new_v7(),
            institute_id: self.institute_id,
            student_fee_id: self.student_fee_id,
            amount: self.amount,
            paid_on: self.paid_on,
            mode: self.mode,
            receipt_no: generate_receipt_no(now),
            remarks: self.remarks,
            created_by: self.created_by,
            created_at: now,
        }
    }
}

/// What storage did with a payment after re-checking the balance
///
/// The balance is read again under a lock when the payment is written, so a
/// concurrent payment that landed first can turn a valid request into
/// `ExceedsDue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Recorded(Payment),
    /// Nothing was written; `due` is the balance at write time
    ExceedsDue { amount: Money, due: Money },
}

impl PaymentOutcome {
    pub fn into_result(self) -> Result<Payment, FeeError> {
        match self {
            PaymentOutcome::Recorded(payment) => Ok(payment),
            PaymentOutcome::ExceedsDue { amount, due } => Err(FeeError::PaymentExceedsDue { amount, due }),
        }
    }
}

/// Generates a receipt number of the form `RCPT-YYYYMMDDHHMMSS-XXXXXX`
///
/// The suffix is six uppercase hex digits from a random UUID. Uniqueness is
/// finally enforced by storage.
pub fn generate_receipt_no(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("RCPT-{}-{}", now.format("%Y%m%d%H%M%S"), suffix)
}
