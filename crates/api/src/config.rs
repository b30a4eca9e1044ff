//! # API Configuration Module
//!
//! Configuration for the campus API server, read from environment variables with
//! defaults where appropriate.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: The host address to bind the server to (default: "0.0.0.0")
//! - `API_PORT`: The port to listen on (default: 8000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: Request timeout (default: 30)
//! - `TIME_ZONE`: IANA zone appointments are interpreted in (default: "Asia/Kathmandu")
//! - `REFERENCE_ID_MAX_ATTEMPTS`: Draws per reference allocation (default: 16)

use campus_core::reference::{DEFAULT_MAX_ATTEMPTS, ReferenceAllocator};
use campus_core::time::{DEFAULT_TIME_ZONE, parse_time_zone};
use chrono_tz::Tz;
use eyre::{Result, WrapErr, eyre};
use std::env;
use tracing::Level;

/// Configuration for the campus API server
///
/// # Example
///
/// ```no_run
/// use eyre::Result;
/// use campus_api::config::ApiConfig;
///
/// fn example() -> Result<()> {
///     let config = ApiConfig::from_env()?;
///     println!("Starting server on {}:{}", config.host, config.port);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Zone legacy appointment times and responses are rendered in
    pub time_zone: Tz,

    /// Upper bound on reference draws per appointment
    pub reference_max_attempts: u32,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The DATABASE_URL environment variable is not set
    /// - The API_PORT value cannot be parsed as a u16
    /// - TIME_ZONE is not a known IANA zone
    /// - REFERENCE_ID_MAX_ATTEMPTS is not a positive integer
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`], reading variables through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Network settings
        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("API_PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url =
            var("DATABASE_URL").ok_or_else(|| eyre!("DATABASE_URL environment variable must be set"))?;

        // Logging settings
        let log_level = match var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()).as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // CORS settings
        let cors_origins = var("API_CORS_ORIGINS")
            .map(|origins| origins.split(',').map(|s| s.trim().to_string()).collect());

        // Performance settings
        let request_timeout = var("API_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .unwrap_or(30);

        // Domain settings
        let time_zone = parse_time_zone(
            &var("TIME_ZONE").unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string()),
        )
        .wrap_err("Invalid TIME_ZONE value")?;

        let reference_max_attempts: u32 = match var("REFERENCE_ID_MAX_ATTEMPTS") {
            Some(raw) => raw
                .parse()
                .wrap_err("Invalid REFERENCE_ID_MAX_ATTEMPTS value")?,
            None => DEFAULT_MAX_ATTEMPTS,
        };
        if reference_max_attempts == 0 {
            return Err(eyre!("REFERENCE_ID_MAX_ATTEMPTS must be at least 1"));
        }

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            request_timeout,
            time_zone,
            reference_max_attempts,
        })
    }

    /// Returns the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allocator(&self) -> Result<ReferenceAllocator> {
        Ok(ReferenceAllocator::with_max_attempts(self.reference_max_attempts)?)
    }
}
