use campus_core::errors::CampusResult;
use campus_core::models::emis::EmisCategory;
use chrono::Utc;
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::models::DbEmisDownload;
use crate::to_campus_error;

pub async fn create_download(
    pool: &Pool<Postgres>,
    title: &str,
    file_url: &str,
    category: EmisCategory,
) -> Result<DbEmisDownload> {
    let download = sqlx::query_as::<_, DbEmisDownload>(
        r#"
        INSERT INTO emis_downloads (id, title, file_url, category, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, file_url, category, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(file_url)
    .bind(category.as_str())
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(download)
}

pub async fn list_downloads(
    pool: &Pool<Postgres>,
    category: Option<EmisCategory>,
) -> Result<Vec<DbEmisDownload>> {
    let downloads = sqlx::query_as::<_, DbEmisDownload>(
        r#"
        SELECT id, title, file_url, category, created_at
        FROM emis_downloads
        WHERE $1::text IS NULL OR category = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(category.map(EmisCategory::as_str))
    .fetch_all(pool)
    .await?;

    Ok(downloads)
}

/// Rewrites `from` to `to` for each pair on the caller's connection, inside
/// whatever transaction it holds. Returns the number of rows moved.
pub async fn remap_categories(
    conn: &mut PgConnection,
    pairs: &[(&str, &str)],
) -> CampusResult<u64> {
    let mut moved = 0;
    for &(from, to) in pairs {
        let result = sqlx::query("UPDATE emis_downloads SET category = $2 WHERE category = $1")
            .bind(from)
            .bind(to)
            .execute(&mut *conn)
            .await
            .map_err(to_campus_error)?;
        moved += result.rows_affected();
    }
    Ok(moved)
}
