//! Departments, notices and events, and the approval flags they share.

use campus_core::approval::{ApprovalGate, PublishableKind};
use campus_core::migration::MigrationUnit;

use super::{MigrationContext, Sql};

pub const DEPARTMENTS_INITIAL: &str = "departments.0001_initial";
pub const DEPARTMENT_EVENT_APPROVAL: &str = "departments.0002_event_approval_flags";
pub const NOTICES_INITIAL: &str = "notices.0001_initial";
pub const NOTICE_APPROVAL: &str = "notices.0002_approval_flags";
pub const EVENTS_INITIAL: &str = "events.0001_initial";
pub const GLOBAL_EVENT_APPROVAL: &str = "events.0002_approval_flags";

/// Both approval columns, defaulting to false so existing rows start unpublished.
fn approval_flags(kind: PublishableKind) -> Sql {
    let table = kind.table();
    let columns = [ApprovalGate::Department, ApprovalGate::Campus].map(ApprovalGate::column);

    Sql::forward(columns.map(|column| {
        format!("ALTER TABLE {table} ADD COLUMN {column} BOOLEAN NOT NULL DEFAULT FALSE")
    }))
    .backward(columns.map(|column| format!("ALTER TABLE {table} DROP COLUMN {column}")))
}

pub fn units() -> Vec<MigrationUnit<MigrationContext>> {
    vec![
        MigrationUnit::new(
            DEPARTMENTS_INITIAL,
            Sql::forward([
                r#"
                CREATE TABLE departments (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    name VARCHAR(255) NOT NULL UNIQUE,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#,
                r#"
                CREATE TABLE department_events (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    department_id UUID NOT NULL REFERENCES departments(id) ON DELETE CASCADE,
                    title VARCHAR(255) NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    event_date DATE NOT NULL,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#,
                "CREATE INDEX idx_department_events_department_id ON department_events(department_id)",
            ])
            .backward(["DROP TABLE department_events", "DROP TABLE departments"]),
        ),
        MigrationUnit::new(
            DEPARTMENT_EVENT_APPROVAL,
            approval_flags(PublishableKind::DepartmentEvent),
        )
        .depends_on([DEPARTMENTS_INITIAL]),
        MigrationUnit::new(
            NOTICES_INITIAL,
            Sql::forward([r#"
                CREATE TABLE notices (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    title VARCHAR(255) NOT NULL,
                    body TEXT NOT NULL DEFAULT '',
                    department_id UUID NULL REFERENCES departments(id) ON DELETE SET NULL,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#])
            .backward(["DROP TABLE notices"]),
        )
        .depends_on([DEPARTMENTS_INITIAL]),
        MigrationUnit::new(NOTICE_APPROVAL, approval_flags(PublishableKind::Notice))
            .depends_on([NOTICES_INITIAL]),
        MigrationUnit::new(
            EVENTS_INITIAL,
            Sql::forward([r#"
                CREATE TABLE global_events (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    title VARCHAR(255) NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    event_date DATE NOT NULL,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#])
            .backward(["DROP TABLE global_events"]),
        ),
        MigrationUnit::new(
            GLOBAL_EVENT_APPROVAL,
            approval_flags(PublishableKind::GlobalEvent),
        )
        .depends_on([EVENTS_INITIAL]),
    ]
}
