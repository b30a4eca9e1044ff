use campus_core::migration::MigrationReport;
use chrono_tz::Tz;
use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

use crate::migrations::{MigrationContext, manifest};

/// Creates the ledger table the migration harness records applied units in.
pub async fn ensure_migration_ledger(pool: &Pool<Postgres>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            name VARCHAR(255) PRIMARY KEY,
            applied_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Brings the schema up to date by running every pending migration unit.
pub async fn initialize_database(pool: &Pool<Postgres>, time_zone: Tz) -> Result<MigrationReport> {
    info!("Initializing database schema...");

    ensure_migration_ledger(pool).await?;
    let ctx = MigrationContext::new(pool.clone(), time_zone);
    let report = manifest().migrate(&ctx).await?;

    info!(
        "Database schema initialized successfully ({} unit(s) applied).",
        report.applied.len()
    );
    Ok(report)
}
