//! Core Kernel - Foundational types shared by the fee ledger crates
//!
//! This crate provides the building blocks used across all domain modules:
//! - Money with precise decimal arithmetic and lenient coercion
//! - Calendar helpers for due dates and reminder run days
//! - Strongly typed identifiers
//! - Port error and health types for the adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use money::{Money, CURRENCY_CODE};
pub use temporal::{Timezone, TemporalError, parse_iso_date, format_iso_date, days_between};
pub use identifiers::{
    InstituteId, UserId, StudentId, BatchId,
    FeePlanId, StudentFeeId, PaymentId,
    ReminderRuleId, NotificationId,
};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    Page, PageRequest,
};
