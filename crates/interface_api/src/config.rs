//! API configuration

use serde::Deserialize;

use core_kernel::{Timezone, TemporalError};

/// API configuration
///
/// Loaded from `API_`-prefixed environment variables; anything unset falls
/// back to the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    /// Log level
    pub log_level: String,
    /// Whether the server runs the periodic reminder job
    pub run_scheduler: bool,
    /// Seconds between reminder runs
    pub reminder_interval_secs: u64,
    /// IANA zone used to decide what "today" is for reminder runs
    pub reminder_timezone: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/fees".to_string(),
            db_max_connections: 10,
            db_min_connections: 2,
            log_level: "info".to_string(),
            run_scheduler: true,
            reminder_interval_secs: 1800,
            reminder_timezone: "Asia/Kolkata".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn reminder_timezone(&self) -> Result<Timezone, TemporalError> {
        Timezone::parse(&self.reminder_timezone)
    }
}
