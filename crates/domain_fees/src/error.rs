//! Fee domain errors

use core_kernel::{Money, PortError};
use thiserror::Error;

/// Errors that can occur in the fee ledger domain
#[derive(Debug, Error)]
pub enum FeeError {
    /// Amount is zero, negative, or otherwise unusable
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Payment would take the balance below zero
    #[error("Payment exceeds due amount: payment={amount}, due={due}")]
    PaymentExceedsDue {
        amount: Money,
        due: Money,
    },

    /// Discount is larger than the total fee
    #[error("Discount {discount} exceeds total fee {total_fee}")]
    DiscountExceedsTotal {
        total_fee: Money,
        discount: Money,
    },

    /// Schedule rejected at creation time
    #[error("Invalid due schedule: {0}")]
    InvalidSchedule(String),

    /// Unknown payment mode
    #[error("Invalid payment mode: {0}")]
    InvalidPaymentMode(String),

    /// Student fee not found
    #[error("Student fee not found: {0}")]
    StudentFeeNotFound(String),

    /// Storage failure
    #[error(transparent)]
    Port(#[from] PortError),
}
