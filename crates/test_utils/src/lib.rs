//! Test Utilities Crate
//!
//! Shared test infrastructure for the fee ledger workspace.
//!
//! # Modules
//!
//! - `fixtures`: the worked fee examples and fixed dates
//! - `builders`: builders for fees, payments, rules and directory profiles
//! - `harness`: in-memory ports wired to a reminder engine
//! - `database`: Postgres container management and seeding
//! - `assertions`: assertion helpers for money and dues
//! - `generators`: proptest strategies for schedules and payments

pub mod fixtures;
pub mod builders;
pub mod harness;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use harness::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
