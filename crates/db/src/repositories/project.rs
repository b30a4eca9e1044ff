use campus_core::errors::{CampusError, CampusResult};
use campus_core::models::project::CreateProjectRequest;
use campus_core::slug::{SlugSource, base_slug, next_free_slug, plan_slugs};
use chrono::Utc;
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::models::{DbProject, DbProjectSlug};
use crate::{is_unique_violation, to_campus_error};

/// Concurrent creators may race for the same suffix; each lost race re-reads the
/// taken slugs and tries again.
const MAX_SLUG_ATTEMPTS: u32 = 5;

/// Slugs already holding `base` or one of its `base-N` variants.
pub async fn taken_slugs(pool: &Pool<Postgres>, base: &str) -> Result<HashSet<String>> {
    let slugs = sqlx::query_scalar::<_, String>(
        "SELECT slug FROM projects WHERE slug = $1 OR starts_with(slug, $1 || '-')",
    )
    .bind(base)
    .fetch_all(pool)
    .await?;

    Ok(slugs.into_iter().collect())
}

pub async fn create_project(
    pool: &Pool<Postgres>,
    request: &CreateProjectRequest,
) -> CampusResult<DbProject> {
    let base = base_slug(request.slug.as_deref(), &request.title);

    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let taken = taken_slugs(pool, &base).await?;
        let slug = next_free_slug(&base, |candidate| taken.contains(candidate));

        let inserted = sqlx::query_as::<_, DbProject>(
            r#"
            INSERT INTO projects (title, slug, description, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, slug, description, created_at
            "#,
        )
        .bind(&request.title)
        .bind(&slug)
        .bind(&request.description)
        .bind(Utc::now())
        .fetch_one(pool)
        .await;

        match inserted {
            Ok(project) => {
                debug!("Created project {} with slug {}", project.id, project.slug);
                return Ok(project);
            }
            Err(err) if is_unique_violation(&err) => {
                warn!(attempt, "Slug {} was taken concurrently, retrying", slug);
            }
            Err(err) => return Err(to_campus_error(err)),
        }
    }

    Err(CampusError::UniqueConstraintViolation(format!(
        "no free slug for {} after {} attempts",
        base, MAX_SLUG_ATTEMPTS
    )))
}

pub async fn get_project_by_slug(pool: &Pool<Postgres>, slug: &str) -> Result<Option<DbProject>> {
    let project = sqlx::query_as::<_, DbProject>(
        "SELECT id, title, slug, description, created_at FROM projects WHERE slug = $1",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(project)
}

pub async fn list_projects(pool: &Pool<Postgres>) -> Result<Vec<DbProject>> {
    let projects = sqlx::query_as::<_, DbProject>(
        "SELECT id, title, slug, description, created_at FROM projects ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(projects)
}

/// Gives every project a distinct slug. Returns the number of rows rewritten.
pub async fn populate_slugs(conn: &mut PgConnection) -> CampusResult<usize> {
    let rows = sqlx::query_as::<_, DbProjectSlug>(
        "SELECT id, title, slug FROM projects ORDER BY id FOR UPDATE",
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(to_campus_error)?;

    let sources: Vec<SlugSource> = rows
        .into_iter()
        .map(|row| SlugSource {
            id: row.id,
            title: row.title,
            slug: row.slug,
        })
        .collect();

    let changed: Vec<_> = plan_slugs(&sources)
        .into_iter()
        .filter(|assignment| assignment.changed)
        .collect();

    for assignment in &changed {
        sqlx::query("UPDATE projects SET slug = $2 WHERE id = $1")
            .bind(assignment.id)
            .bind(&assignment.slug)
            .execute(&mut *conn)
            .await
            .map_err(to_campus_error)?;
    }

    Ok(changed.len())
}
