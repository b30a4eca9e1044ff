//! # Error Handling Middleware
//!
//! Maps [`CampusError`] onto HTTP status codes and a JSON body of the form
//! `{"error": "<message>"}`, so every handler reports failures the same way.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use campus_core::errors::CampusError;
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use campus_api::middleware::error_handling::AppError;
/// use campus_core::errors::CampusError;
///
/// async fn handler(slug: String) -> Result<Json<String>, AppError> {
///     if slug.is_empty() {
///         return Err(AppError(CampusError::Validation("Slug is required".to_string())));
///     }
///     Ok(Json(slug))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub CampusError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CampusError::NotFound(_) => StatusCode::NOT_FOUND,
            CampusError::Validation(_) => StatusCode::BAD_REQUEST,
            CampusError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            CampusError::AllocationExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CampusError::MigrationDependencyUnmet { .. }
            | CampusError::MigrationCycle(_)
            | CampusError::MigrationBackfill { .. }
            | CampusError::Database(_)
            | CampusError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:?}", self.0);
        }

        let message = self.0.to_string();
        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

/// Allows `?` on functions returning `Result<T, CampusError>` inside handlers.
impl From<CampusError> for AppError {
    fn from(err: CampusError) -> Self {
        AppError(err)
    }
}

/// Repository failures surface as database errors.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(CampusError::Database(err))
    }
}

/// Maps a CampusError straight to an HTTP response
pub fn map_error(err: CampusError) -> Response {
    AppError(err).into_response()
}
