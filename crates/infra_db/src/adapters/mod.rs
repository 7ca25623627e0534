//! Domain Adapters
//!
//! PostgreSQL implementations of the domain ports. Each adapter:
//! - Implements one port trait
//! - Translates between domain models and repository row types
//! - Maps `DatabaseError` to `PortError`
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresFeeLedgerAdapter;
//! use domain_fees::FeeLedgerPort;
//!
//! let fees: Arc<dyn FeeLedgerPort> = Arc::new(PostgresFeeLedgerAdapter::new(pool));
//! let fee = fees.get_student_fee(fee_id).await?;
//! ```

pub mod directory;
pub mod fees;
pub mod notifications;
pub mod reminders;

pub use directory::PostgresDirectoryAdapter;
pub use fees::PostgresFeeLedgerAdapter;
pub use notifications::PostgresNotificationAdapter;
pub use reminders::PostgresReminderRuleAdapter;

use chrono::Utc;
use core_kernel::{AdapterHealth, HealthCheckResult};
use sqlx::PgPool;

/// Runs `SELECT 1` and reports latency under `adapter_id`
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: Utc::now(),
        },
        Err(e) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(format!("Database error: {}", e)),
            checked_at: Utc::now(),
        },
    }
}
