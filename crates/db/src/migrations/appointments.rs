//! Appointment table history: reference IDs and the single scheduling instant are
//! each introduced relaxed, backfilled, then tightened.

use async_trait::async_trait;
use campus_core::errors::CampusResult;
use campus_core::migration::{MigrationKind, MigrationStep, MigrationUnit};
use tracing::info;

use super::{MigrationContext, PgTransaction, Sql, execute_all};
use crate::repositories::appointment;
use crate::to_campus_error;

pub const INITIAL: &str = "appointments.0001_initial";
pub const STATUS: &str = "appointments.0002_appointment_status";
pub const ADD_REFERENCE_ID: &str = "appointments.0003_add_reference_id";
pub const POPULATE_REFERENCE_ID: &str = "appointments.0004_populate_reference_id";
pub const UNIQUE_REFERENCE_ID: &str = "appointments.0005_unique_reference_id";
pub const PURPOSE: &str = "appointments.0006_appointment_purpose";
pub const ADD_DATETIME: &str = "appointments.0007_add_appointment_datetime";
pub const POPULATE_DATETIME: &str = "appointments.0008_populate_appointment_datetime";
pub const REQUIRE_DATETIME: &str = "appointments.0009_require_datetime_drop_legacy";

pub fn units() -> Vec<MigrationUnit<MigrationContext>> {
    vec![
        MigrationUnit::new(
            INITIAL,
            Sql::forward([r#"
                CREATE TABLE appointments (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    full_name VARCHAR(255) NOT NULL,
                    email VARCHAR(254) NOT NULL,
                    phone VARCHAR(32) NOT NULL,
                    appointment_date DATE NOT NULL,
                    appointment_time VARCHAR(32) NULL,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
                )
                "#])
            .backward(["DROP TABLE appointments"]),
        ),
        MigrationUnit::new(
            STATUS,
            Sql::forward([
                "ALTER TABLE appointments ADD COLUMN status VARCHAR(20) NOT NULL DEFAULT 'pending'",
            ])
            .backward(["ALTER TABLE appointments DROP COLUMN status"]),
        )
        .depends_on([INITIAL]),
        MigrationUnit::new(
            ADD_REFERENCE_ID,
            Sql::forward(["ALTER TABLE appointments ADD COLUMN reference_id VARCHAR(10) NULL"])
                .backward(["ALTER TABLE appointments DROP COLUMN reference_id"]),
        )
        .depends_on([STATUS])
        .kind(MigrationKind::IntroduceRelaxed),
        MigrationUnit::new(POPULATE_REFERENCE_ID, PopulateReferenceIds)
            .depends_on([ADD_REFERENCE_ID])
            .kind(MigrationKind::Backfill),
        MigrationUnit::new(
            UNIQUE_REFERENCE_ID,
            Sql::forward([
                "ALTER TABLE appointments ADD CONSTRAINT appointments_reference_id_key UNIQUE (reference_id)",
            ])
            .backward(["ALTER TABLE appointments DROP CONSTRAINT appointments_reference_id_key"]),
        )
        .depends_on([POPULATE_REFERENCE_ID])
        .kind(MigrationKind::Tighten),
        MigrationUnit::new(
            PURPOSE,
            Sql::forward(["ALTER TABLE appointments ADD COLUMN purpose TEXT NULL"])
                .backward(["ALTER TABLE appointments DROP COLUMN purpose"]),
        )
        .depends_on([UNIQUE_REFERENCE_ID]),
        MigrationUnit::new(
            ADD_DATETIME,
            Sql::forward([
                "ALTER TABLE appointments ADD COLUMN appointment_datetime TIMESTAMP WITH TIME ZONE NULL",
            ])
            .backward(["ALTER TABLE appointments DROP COLUMN appointment_datetime"]),
        )
        .depends_on([PURPOSE])
        .kind(MigrationKind::IntroduceRelaxed),
        MigrationUnit::new(POPULATE_DATETIME, PopulateAppointmentDatetimes)
            .depends_on([ADD_DATETIME])
            .kind(MigrationKind::Backfill),
        MigrationUnit::new(REQUIRE_DATETIME, RequireDatetime)
            .depends_on([POPULATE_DATETIME])
            .kind(MigrationKind::Tighten),
    ]
}

/// Gives every appointment without a reference one. Errors abort the migration.
///
/// References are claimed through the pool so each claim races the unique
/// index like any other writer. Rows written before a failure stay; a rerun
/// only picks up rows that are still empty.
pub struct PopulateReferenceIds;

#[async_trait]
impl MigrationStep<MigrationContext> for PopulateReferenceIds {
    async fn forward(&self, ctx: &MigrationContext, _tx: &mut PgTransaction) -> CampusResult<()> {
        let assigned = appointment::populate_reference_ids(&ctx.pool, &ctx.allocator).await?;
        info!("Assigned reference IDs to {} appointment(s)", assigned);
        Ok(())
    }

    async fn backward(&self, _ctx: &MigrationContext, _tx: &mut PgTransaction) -> CampusResult<()> {
        Ok(())
    }
}

/// Folds `appointment_date` and `appointment_time` into `appointment_datetime`
/// for rows that do not have one yet.
pub struct PopulateAppointmentDatetimes;

#[async_trait]
impl MigrationStep<MigrationContext> for PopulateAppointmentDatetimes {
    async fn forward(&self, ctx: &MigrationContext, tx: &mut PgTransaction) -> CampusResult<()> {
        let populated =
            appointment::populate_appointment_datetimes(&mut **tx, &ctx.time_zone).await?;
        info!("Populated appointment_datetime on {} appointment(s)", populated);
        Ok(())
    }

    async fn backward(&self, _ctx: &MigrationContext, _tx: &mut PgTransaction) -> CampusResult<()> {
        Ok(())
    }
}

/// Makes `appointment_datetime` required and drops the legacy pair. The inverse
/// restores the pair from the instant, rendered in the configured zone.
pub struct RequireDatetime;

#[async_trait]
impl MigrationStep<MigrationContext> for RequireDatetime {
    async fn forward(&self, _ctx: &MigrationContext, tx: &mut PgTransaction) -> CampusResult<()> {
        execute_all(
            &mut **tx,
            &[
                "ALTER TABLE appointments ALTER COLUMN appointment_datetime SET NOT NULL",
                "ALTER TABLE appointments DROP COLUMN appointment_date",
                "ALTER TABLE appointments DROP COLUMN appointment_time",
            ],
        )
        .await
    }

    async fn backward(&self, ctx: &MigrationContext, tx: &mut PgTransaction) -> CampusResult<()> {
        execute_all(
            &mut **tx,
            &[
                "ALTER TABLE appointments ADD COLUMN appointment_date DATE NULL",
                "ALTER TABLE appointments ADD COLUMN appointment_time VARCHAR(32) NULL",
            ],
        )
        .await?;

        sqlx::query(
            r#"
            UPDATE appointments
            SET appointment_date = (appointment_datetime AT TIME ZONE $1)::date,
                appointment_time = to_char(appointment_datetime AT TIME ZONE $1, 'HH24:MI')
            "#,
        )
        .bind(ctx.time_zone.name())
        .execute(&mut **tx)
        .await
        .map_err(to_campus_error)?;

        execute_all(
            &mut **tx,
            &[
                "ALTER TABLE appointments ALTER COLUMN appointment_date SET NOT NULL",
                "ALTER TABLE appointments ALTER COLUMN appointment_datetime DROP NOT NULL",
            ],
        )
        .await
    }
}
