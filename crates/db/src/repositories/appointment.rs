use async_trait::async_trait;
use campus_core::errors::{CampusError, CampusResult};
use campus_core::models::appointment::{AppointmentStatus, CreateAppointmentRequest};
use campus_core::reference::{
    Allocation, Assignment, Claim, ReferenceAllocator, ReferenceId, ReferenceStore,
};
use campus_core::time::LegacySchedule;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{DbAppointment, DbLegacyAppointment};
use crate::{is_unique_violation, to_campus_error};

const APPOINTMENT_COLUMNS: &str = "id, full_name, email, phone, purpose, status, \
     appointment_datetime, reference_id, created_at";

/// [`ReferenceStore`] over the `appointments` table.
#[derive(Debug, Clone, Copy)]
pub struct PgReferenceStore<'a> {
    pool: &'a Pool<Postgres>,
}

impl<'a> PgReferenceStore<'a> {
    pub fn new(pool: &'a Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceStore for PgReferenceStore<'_> {
    async fn reference_exists(&self, reference: &ReferenceId) -> CampusResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM appointments WHERE reference_id = $1)",
        )
        .bind(reference.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(to_campus_error)
    }

    async fn assign_reference(
        &self,
        appointment_id: Uuid,
        reference: &ReferenceId,
    ) -> CampusResult<Assignment> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE appointments
            SET reference_id = $2
            WHERE id = $1 AND (reference_id IS NULL OR reference_id = '')
            RETURNING id
            "#,
        )
        .bind(appointment_id)
        .bind(reference.as_str())
        .fetch_optional(self.pool)
        .await;

        match updated {
            Ok(Some(_)) => return Ok(Assignment::Assigned),
            Ok(None) => {}
            Err(err) if is_unique_violation(&err) => return Ok(Assignment::Conflict),
            Err(err) => return Err(to_campus_error(err)),
        }

        let current = sqlx::query_scalar::<_, Option<String>>(
            "SELECT reference_id FROM appointments WHERE id = $1",
        )
        .bind(appointment_id)
        .fetch_optional(self.pool)
        .await
        .map_err(to_campus_error)?
        .ok_or_else(|| CampusError::NotFound(format!("Appointment {}", appointment_id)))?;

        match current {
            Some(current) if !current.is_empty() => {
                Ok(Assignment::AlreadyAssigned(ReferenceId::parse(&current)?))
            }
            // Blanked again between the update and the read; let the allocator retry.
            _ => Ok(Assignment::Conflict),
        }
    }
}

/// Inserts an appointment together with a freshly allocated reference, so the row
/// is never visible without one.
pub async fn create_appointment(
    pool: &Pool<Postgres>,
    allocator: &ReferenceAllocator,
    request: &CreateAppointmentRequest,
) -> CampusResult<Allocation<DbAppointment>> {
    request.validate()?;
    let store = PgReferenceStore::new(pool);

    let query = format!(
        r#"
        INSERT INTO appointments (id, full_name, email, phone, purpose, status, appointment_datetime, reference_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    );

    let allocation = allocator
        .allocate_with(&store, |candidate| {
            let query = query.as_str();
            async move {
                let inserted = sqlx::query_as::<_, DbAppointment>(query)
                    .bind(Uuid::new_v4())
                    .bind(&request.full_name)
                    .bind(&request.email)
                    .bind(&request.phone)
                    .bind(request.purpose.as_deref())
                    .bind(AppointmentStatus::Pending.as_str())
                    .bind(request.appointment_datetime)
                    .bind(candidate.as_str())
                    .bind(Utc::now())
                    .fetch_one(pool)
                    .await;

                match inserted {
                    Ok(appointment) => Ok(Claim::Claimed(appointment)),
                    Err(err) if is_unique_violation(&err) => Ok(Claim::Taken),
                    Err(err) => Err(to_campus_error(err)),
                }
            }
        })
        .await?;

    debug!(
        "Appointment created: id={}, reference={}, attempts={}",
        allocation.value.id, allocation.reference, allocation.attempts
    );
    Ok(allocation)
}

pub async fn get_appointment_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbAppointment>> {
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(appointment)
}

/// Case-sensitive lookup by reference.
pub async fn get_appointment_by_reference(
    pool: &Pool<Postgres>,
    reference: &ReferenceId,
) -> Result<Option<DbAppointment>> {
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE reference_id = $1"
    ))
    .bind(reference.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(appointment)
}

/// Moves an appointment to a new instant. Only `appointment_datetime` is written.
pub async fn reschedule_appointment(
    pool: &Pool<Postgres>,
    id: Uuid,
    appointment_datetime: DateTime<Utc>,
) -> Result<Option<DbAppointment>> {
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        UPDATE appointments
        SET appointment_datetime = $2
        WHERE id = $1
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(appointment_datetime)
    .fetch_optional(pool)
    .await?;

    Ok(appointment)
}

pub async fn update_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    status: AppointmentStatus,
) -> Result<Option<DbAppointment>> {
    let appointment = sqlx::query_as::<_, DbAppointment>(&format!(
        r#"
        UPDATE appointments
        SET status = $2
        WHERE id = $1
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(appointment)
}

/// Gives one appointment a reference if it has none; an existing one is kept.
pub async fn assign_missing_reference(
    pool: &Pool<Postgres>,
    allocator: &ReferenceAllocator,
    id: Uuid,
) -> CampusResult<ReferenceId> {
    let allocation = allocator.assign(&PgReferenceStore::new(pool), id).await?;
    Ok(allocation.reference)
}

/// Assigns references to every appointment still lacking one, oldest first.
/// The first failure aborts the run; rows done so far keep their reference.
pub async fn populate_reference_ids(
    pool: &Pool<Postgres>,
    allocator: &ReferenceAllocator,
) -> CampusResult<usize> {
    let pending = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
        FROM appointments
        WHERE reference_id IS NULL OR reference_id = ''
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(to_campus_error)?;

    let store = PgReferenceStore::new(pool);
    for id in &pending {
        let allocation = allocator.assign(&store, *id).await?;
        debug!("Appointment {} -> {}", id, allocation.reference);
    }

    Ok(pending.len())
}

/// Writes `appointment_datetime` for every row that lacks it, from the legacy
/// date and time string. Unreadable times become 09:00; rows are never skipped.
pub async fn populate_appointment_datetimes(conn: &mut PgConnection, tz: &Tz) -> CampusResult<usize> {
    let rows = sqlx::query_as::<_, DbLegacyAppointment>(
        r#"
        SELECT id, appointment_date, appointment_time
        FROM appointments
        WHERE appointment_datetime IS NULL
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(to_campus_error)?;

    let mut populated = 0;
    for row in rows {
        let legacy = LegacySchedule::new(row.appointment_date, row.appointment_time);
        let instant = legacy.normalize(tz).with_timezone(&Utc);

        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET appointment_datetime = $2
            WHERE id = $1 AND appointment_datetime IS NULL
            "#,
        )
        .bind(row.id)
        .bind(instant)
        .execute(&mut *conn)
        .await
        .map_err(to_campus_error)?;
        populated += result.rows_affected() as usize;
    }

    info!("Normalized {} legacy appointment time(s) in {}", populated, tz.name());
    Ok(populated)
}
