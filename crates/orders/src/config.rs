//! Order store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `ORDERS_DATABASE_URL` - `SQLite` connection string (falls back to
//!   `DATABASE_URL`, then `sqlite://orders.db`)
//! - `ORDERS_HOST` - Bind address (default: 127.0.0.1)
//! - `ORDERS_PORT` - Listen port (default: 3000)
//! - `ORDERS_RATE_LIMIT` - Per-IP rate limiting on `/api` (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 1.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://orders.db";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Order store configuration.
#[derive(Debug, Clone)]
pub struct OrdersConfig {
    /// `SQLite` connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Whether `/api` routes are rate limited per client IP
    pub rate_limit: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl OrdersConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ORDERS_DATABASE_URL");
        let host = get_env_or_default("ORDERS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ORDERS_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ORDERS_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ORDERS_PORT".to_string(), e.to_string()))?;
        let rate_limit = parse_bool("ORDERS_RATE_LIMIT", &get_env_or_default("ORDERS_RATE_LIMIT", "true"))?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            rate_limit,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Configuration for tests: in-memory database, no rate limiting, no Sentry.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            database_url: SecretString::from("sqlite::memory:"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`, then the local file.
fn get_database_url(primary_key: &str) -> SecretString {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_or_else(
            |_| SecretString::from(DEFAULT_DATABASE_URL),
            SecretString::from,
        )
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}
