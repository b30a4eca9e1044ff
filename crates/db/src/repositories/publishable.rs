use campus_core::approval::{ApprovalGate, PublishableKind};
use chrono::{NaiveDate, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    DbApproval, DbDepartment, DbDepartmentEvent, DbGlobalEvent, DbNotice, DbPublishedItem,
};

/// Column expressions mapping each table onto [`DbPublishedItem`].
fn listing_columns(kind: PublishableKind) -> &'static str {
    match kind {
        PublishableKind::Notice => "id, title, body AS summary, NULL::date AS event_date, created_at",
        PublishableKind::DepartmentEvent | PublishableKind::GlobalEvent => {
            "id, title, description AS summary, event_date, created_at"
        }
    }
}

/// Grants or withdraws one approval. Only that flag's column is written.
pub async fn set_approval(
    pool: &Pool<Postgres>,
    kind: PublishableKind,
    id: Uuid,
    gate: ApprovalGate,
    approved: bool,
) -> Result<Option<DbApproval>> {
    debug!("Setting {} approval on {} {} to {}", gate, kind, id, approved);

    let approval = sqlx::query_as::<_, DbApproval>(&format!(
        r#"
        UPDATE {table}
        SET {column} = $2
        WHERE id = $1
        RETURNING id, is_approved_by_department, is_approved_by_campus
        "#,
        table = kind.table(),
        column = gate.column(),
    ))
    .bind(id)
    .bind(approved)
    .fetch_optional(pool)
    .await?;

    Ok(approval)
}

pub async fn get_approval(
    pool: &Pool<Postgres>,
    kind: PublishableKind,
    id: Uuid,
) -> Result<Option<DbApproval>> {
    let approval = sqlx::query_as::<_, DbApproval>(&format!(
        "SELECT id, is_approved_by_department, is_approved_by_campus FROM {} WHERE id = $1",
        kind.table()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(approval)
}

/// Items approved by both the department and the campus, newest first.
pub async fn list_visible(pool: &Pool<Postgres>, kind: PublishableKind) -> Result<Vec<DbPublishedItem>> {
    let items = sqlx::query_as::<_, DbPublishedItem>(&format!(
        r#"
        SELECT {columns}
        FROM {table}
        WHERE is_approved_by_department AND is_approved_by_campus
        ORDER BY created_at DESC
        "#,
        columns = listing_columns(kind),
        table = kind.table(),
    ))
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn create_department(pool: &Pool<Postgres>, name: &str) -> Result<DbDepartment> {
    let department = sqlx::query_as::<_, DbDepartment>(
        r#"
        INSERT INTO departments (id, name, created_at)
        VALUES ($1, $2, $3)
        RETURNING id, name, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(department)
}

pub async fn create_notice(
    pool: &Pool<Postgres>,
    title: &str,
    body: &str,
    department_id: Option<Uuid>,
) -> Result<DbNotice> {
    let notice = sqlx::query_as::<_, DbNotice>(
        r#"
        INSERT INTO notices (id, title, body, department_id, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, body, department_id, is_approved_by_department, is_approved_by_campus, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(body)
    .bind(department_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(notice)
}

pub async fn create_department_event(
    pool: &Pool<Postgres>,
    department_id: Uuid,
    title: &str,
    description: &str,
    event_date: NaiveDate,
) -> Result<DbDepartmentEvent> {
    let event = sqlx::query_as::<_, DbDepartmentEvent>(
        r#"
        INSERT INTO department_events (id, department_id, title, description, event_date, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, department_id, title, description, event_date,
                  is_approved_by_department, is_approved_by_campus, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(department_id)
    .bind(title)
    .bind(description)
    .bind(event_date)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(event)
}

pub async fn create_global_event(
    pool: &Pool<Postgres>,
    title: &str,
    description: &str,
    event_date: NaiveDate,
) -> Result<DbGlobalEvent> {
    let event = sqlx::query_as::<_, DbGlobalEvent>(
        r#"
        INSERT INTO global_events (id, title, description, event_date, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, description, event_date,
                  is_approved_by_department, is_approved_by_campus, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(description)
    .bind(event_date)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(event)
}
