//! Reminder domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur while managing rules or running reminders
#[derive(Debug, Error)]
pub enum ReminderError {
    /// Run date is not an ISO calendar date
    #[error("Invalid run date '{0}': expected YYYY-MM-DD")]
    InvalidRunDate(String),

    /// Rule fields out of range
    #[error("Invalid reminder rule: {0}")]
    InvalidRule(String),

    /// Storage failure; aborts the current run
    #[error(transparent)]
    Port(#[from] PortError),
}
