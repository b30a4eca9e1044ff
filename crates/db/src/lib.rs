pub mod migrations;
pub mod models;
pub mod repositories;
pub mod schema;

pub mod mock;

use campus_core::errors::CampusError;
use eyre::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Whether `err` is a unique-constraint rejection.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Lifts a driver error into the domain error, keeping unique violations distinct.
pub fn to_campus_error(err: sqlx::Error) -> CampusError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let constraint = db_err
                .constraint()
                .map(str::to_string)
                .unwrap_or_else(|| db_err.message().to_string());
            return CampusError::UniqueConstraintViolation(constraint);
        }
    }
    if matches!(err, sqlx::Error::RowNotFound) {
        return CampusError::NotFound("Row not found".to_string());
    }
    CampusError::Database(err.into())
}
