//! Fee Ledger Domain
//!
//! This crate owns the student fee records of an institute and the
//! computation of what is still owed on them.
//!
//! # Due-Schedule Resolution
//!
//! A student fee carries a total, a discount, an installment schedule and
//! the payments recorded against it. Payments are never linked to a single
//! installment. Instead they are applied as a running waterfall over the
//! schedule sorted by due date:
//!
//! - `amount_due = max(total_fee - discount - paid, 0)`
//! - each installment consumes `min(remaining_paid, amount)`
//! - installments with something left over are outstanding
//! - the first outstanding installment is the next due
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use core_kernel::Money;
//! use domain_fees::{DueSchedule, FeeLedger, Installment};
//!
//! let schedule = DueSchedule::new(vec![
//!     Installment::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), Money::from_major(3000)),
//!     Installment::new(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), Money::from_major(3000)),
//!     Installment::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), Money::from_major(2500)),
//! ]);
//! let ledger = FeeLedger::new(
//!     Money::from_major(9000),
//!     Money::from_major(500),
//!     &schedule,
//!     [Money::from_major(2500)],
//! );
//!
//! assert_eq!(ledger.amount_due(), Money::from_major(6000));
//! let next = ledger.next_due_installment().unwrap();
//! assert_eq!(next.outstanding_amount, Money::from_major(500));
//! ```

pub mod schedule;
pub mod ledger;
pub mod student_fee;
pub mod payment;
pub mod dues;
pub mod directory;
pub mod error;
pub mod ports;

pub use schedule::{DueSchedule, Installment};
pub use ledger::{FeeLedger, OutstandingInstallment, NextDue};
pub use student_fee::{StudentFee, NewStudentFee};
pub use payment::{Payment, PaymentMode, PaymentOutcome, NewPayment, generate_receipt_no};
pub use dues::{DueFilter, DueItem, DashboardSummary, UpcomingDue, DirectoryNames};
pub use directory::{StudentProfile, BatchProfile};
pub use error::FeeError;
pub use ports::{FeeLedgerPort, DirectoryPort, FeeQuery, PaymentQuery};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockFeeLedgerPort, MockDirectoryPort};
