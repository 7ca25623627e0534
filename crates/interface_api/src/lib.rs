//! HTTP API Layer
//!
//! REST API for the fee ledger and the reminder engine, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: fees, payments, dues, dashboard, reminder rules, notifications
//! - **Middleware**: JWT authentication and audit logging
//! - **DTOs**: request and response bodies with `validator` checks
//! - **Scheduler**: the periodic reminder run
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::postgres(pool, config)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;
pub mod scheduler;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::{TemporalError, Timezone};
use domain_fees::{DirectoryPort, FeeLedgerPort};
use domain_reminders::{NotificationPort, ReminderEngine, ReminderRulePort};
use infra_db::{
    DatabasePool, PostgresDirectoryAdapter, PostgresFeeLedgerAdapter, PostgresNotificationAdapter,
    PostgresReminderRuleAdapter,
};

use crate::config::ApiConfig;
use crate::handlers::{dashboard, dues, fees, health, notifications, payments, reminder_rules};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub fees: Arc<dyn FeeLedgerPort>,
    pub directory: Arc<dyn DirectoryPort>,
    pub rules: Arc<dyn ReminderRulePort>,
    pub notifications: Arc<dyn NotificationPort>,
    pub engine: ReminderEngine,
    /// Zone that decides "today" for reminder runs
    pub timezone: Timezone,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the engine over the given ports
    pub fn new(
        fees: Arc<dyn FeeLedgerPort>,
        directory: Arc<dyn DirectoryPort>,
        rules: Arc<dyn ReminderRulePort>,
        notifications: Arc<dyn NotificationPort>,
        config: ApiConfig,
    ) -> Result<Self, TemporalError> {
        let timezone = config.reminder_timezone()?;
        let engine = ReminderEngine::new(
            fees.clone(),
            directory.clone(),
            rules.clone(),
            notifications.clone(),
        );
        Ok(Self {
            fees,
            directory,
            rules,
            notifications,
            engine,
            timezone,
            config,
        })
    }

    /// State backed by the PostgreSQL adapters
    pub fn postgres(pool: DatabasePool, config: ApiConfig) -> Result<Self, TemporalError> {
        Self::new(
            Arc::new(PostgresFeeLedgerAdapter::new(pool.clone())),
            Arc::new(PostgresDirectoryAdapter::new(pool.clone())),
            Arc::new(PostgresReminderRuleAdapter::new(pool.clone())),
            Arc::new(PostgresNotificationAdapter::new(pool)),
            config,
        )
    }
}

/// Creates the main API router
///
/// Health probes are public; everything under `/api/v1` requires a bearer
/// token and is audit logged.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let fee_routes = Router::new()
        .route(
            "/student-fees",
            post(fees::create_student_fee).get(fees::list_student_fees),
        )
        .route("/student-fees/:id", get(fees::get_student_fee))
        .route(
            "/payments",
            post(payments::create_payment).get(payments::list_payments),
        )
        .route("/dues", get(dues::list_dues));

    let notification_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route(
            "/reminder-rules",
            get(reminder_rules::list_rules).post(reminder_rules::create_rule),
        )
        .route(
            "/reminder-rules/:id",
            patch(reminder_rules::update_rule).delete(reminder_rules::delete_rule),
        )
        .route("/run-reminders", post(reminder_rules::run_reminders))
        .route("/:id/read", patch(notifications::mark_read))
        .route("/:id/whatsapp-template", get(notifications::whatsapp_template));

    let api_routes = Router::new()
        .nest("/fees", fee_routes)
        .route("/dashboard/fees", get(dashboard::fee_summary))
        .nest("/notifications", notification_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
