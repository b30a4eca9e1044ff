//! # Campus API
//!
//! The API crate provides the web server for the campus backend: appointment
//! booking and lookup by reference, approval toggles and public listings for
//! notices and events, EMIS downloads and projects.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Turn requests into repository calls and shape the responses
//! - **Middleware**: Error mapping onto HTTP responses
//! - **Config**: Handle environment and application configuration
//!
//! The API uses Axum as the web framework and SQLx for database interactions.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Error handling shared by all handlers
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, error_handling::HandleErrorLayer, http::StatusCode};
use campus_core::reference::ReferenceAllocator;
use chrono_tz::Tz;
use eyre::{Result, WrapErr};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower::BoxError;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
    /// Zone appointment instants are rendered in
    pub time_zone: Tz,
    /// Issues reference IDs for new appointments
    pub allocator: ReferenceAllocator,
}

/// Every route of the API, without transport layers.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Appointment booking and administration
        .merge(routes::appointments::routes())
        // EMIS downloads
        .merge(routes::emis::routes())
        // Projects
        .merge(routes::projects::routes())
        // Notices and events, matched last since `:kind` is a catch-all segment
        .merge(routes::publishing::routes())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse()
                .wrap_err_with(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_origin(AllowOrigin::list(origins)))
}

/// Starts the API server with the provided configuration and database connection
///
/// # Example
///
/// ```no_run
/// # async fn run() -> eyre::Result<()> {
/// let config = campus_api::config::ApiConfig::from_env()?;
/// let db_pool = campus_db::create_pool(&config.database_url).await?;
/// campus_api::start_server(config, db_pool).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_server(config: config::ApiConfig, db_pool: PgPool) -> Result<()> {
    // Create shared state with dependencies
    let state = Arc::new(ApiState {
        db_pool,
        time_zone: config.time_zone,
        allocator: config.allocator()?,
    });

    let app = router(state);

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)?),
        None => app,
    };

    // Add request timeout middleware
    let app = app.layer(
        tower::ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|_: BoxError| async {
                StatusCode::REQUEST_TIMEOUT
            }))
            .timeout(Duration::from_secs(config.request_timeout)),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        "Server listening on http://{} (time zone {})",
        addr,
        config.time_zone.name()
    );
    axum::serve(listener, app).await?;

    Ok(())
}
