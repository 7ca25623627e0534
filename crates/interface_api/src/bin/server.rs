//! Fee Ledger API Server
//!
//! Starts the HTTP API and, unless disabled, the periodic reminder job.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin fee-ledger-api
//!
//! API_PORT=9000 API_DATABASE_URL=postgres://... cargo run --bin fee-ledger-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - trace, debug, info, warn or error (default: info)
//! * `API_RUN_SCHEDULER` - Run the reminder job in this process (default: true)
//! * `API_REMINDER_INTERVAL_SECS` - Seconds between reminder runs (default: 1800)
//! * `API_REMINDER_TIMEZONE` - IANA zone for the run date (default: Asia/Kolkata)

use anyhow::Context;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use infra_db::{create_pool, run_migrations, DatabaseConfig};
use interface_api::{config::ApiConfig, create_router, scheduler, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config();
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting fee ledger API server"
    );

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.clone())
            .max_connections(config.db_max_connections)
            .min_connections(config.db_min_connections),
    )
    .await
    .context("connecting to database")?;
    tracing::info!("Database connection established");

    run_migrations(&pool).await.context("applying migrations")?;
    tracing::info!("Database migrations applied");

    let state = AppState::postgres(pool, config.clone()).context("invalid reminder timezone")?;

    let reminder_job = config.run_scheduler.then(|| {
        scheduler::spawn_reminder_job(
            state.engine.clone(),
            state.timezone,
            Duration::from_secs(config.reminder_interval_secs.max(1)),
        )
    });

    let app = create_router(state);
    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(job) = reminder_job {
        job.abort();
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Reads `API_*` variables, falling back to defaults when they do not parse
fn load_config() -> ApiConfig {
    ApiConfig::from_env().unwrap_or_else(|e| {
        eprintln!("configuration error ({e}), using defaults");
        ApiConfig::default()
    })
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
