use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub purpose: Option<String>,
    pub status: String,
    pub appointment_datetime: DateTime<Utc>,
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An appointment row as it looks between `0007` and `0009`.
#[derive(Debug, Clone, FromRow)]
pub struct DbLegacyAppointment {
    pub id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbDepartment {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbNotice {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub department_id: Option<Uuid>,
    pub is_approved_by_department: bool,
    pub is_approved_by_campus: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbDepartmentEvent {
    pub id: Uuid,
    pub department_id: Uuid,
    pub title: String,
    pub description: String,
    pub event_date: NaiveDate,
    pub is_approved_by_department: bool,
    pub is_approved_by_campus: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbGlobalEvent {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub event_date: NaiveDate,
    pub is_approved_by_department: bool,
    pub is_approved_by_campus: bool,
    pub created_at: DateTime<Utc>,
}

/// Approval columns of any publishable row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow)]
pub struct DbApproval {
    pub id: Uuid,
    pub is_approved_by_department: bool,
    pub is_approved_by_campus: bool,
}

/// Columns common to the three publishable tables, for public listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbPublishedItem {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub event_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbEmisDownload {
    pub id: Uuid,
    pub title: String,
    pub file_url: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbProject {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbProjectSlug {
    pub id: i64,
    pub title: String,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbMigrationRecord {
    pub name: String,
    pub applied_at: DateTime<Utc>,
}
