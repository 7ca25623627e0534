//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the fee ledger, the student/batch directory,
//! reminder rules and notifications, built on SQLx.
//!
//! # Architecture
//!
//! - [`repositories`] own the SQL and return row structs
//! - [`adapters`] implement the domain ports on top of the repositories
//! - [`pool`] creates the connection pool and applies the embedded migrations
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::adapters::PostgresFeeLedgerAdapter;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/fees")).await?;
//! run_migrations(&pool).await?;
//! let fees = PostgresFeeLedgerAdapter::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{
    PostgresDirectoryAdapter, PostgresFeeLedgerAdapter, PostgresNotificationAdapter,
    PostgresReminderRuleAdapter,
};
pub use error::{db_to_port_error, DatabaseError};
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool, MIGRATOR};
