pub mod repositories;

use eyre::Result;
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::DbPool;

/// Connection string for the integration database, if one is configured.
pub fn test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

/// A pool whose connections all live in a fresh, empty schema, so tests sharing
/// one database never see each other's tables.
pub async fn create_test_pool(database_url: &str) -> Result<DbPool> {
    let schema = format!("test_{}", Uuid::new_v4().simple());

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;
    sqlx::query(&format!("CREATE SCHEMA {}", schema))
        .execute(&admin)
        .await?;
    admin.close().await;

    let search_path = format!("SET search_path TO {}, public", schema);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .after_connect(move |conn, _meta| {
            let search_path = search_path.clone();
            Box::pin(async move {
                conn.execute(search_path.as_str()).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await?;

    Ok(pool)
}
