use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use campus_core::{
    errors::CampusError,
    models::appointment::{
        AppointmentResponse, CreateAppointmentRequest, RescheduleAppointmentRequest,
        UpdateAppointmentStatusRequest,
    },
    reference::ReferenceId,
};
use campus_db::models::DbAppointment;
use campus_db::repositories::appointment;
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

fn to_response(db_appointment: DbAppointment, tz: &Tz) -> Result<AppointmentResponse, AppError> {
    let reference_id = db_appointment
        .reference_id
        .as_deref()
        .filter(|reference| !reference.is_empty())
        .map(ReferenceId::parse)
        .transpose()?;

    Ok(AppointmentResponse {
        id: db_appointment.id,
        reference_id,
        full_name: db_appointment.full_name,
        status: db_appointment.status.parse()?,
        appointment_datetime: db_appointment
            .appointment_datetime
            .with_timezone(tz)
            .to_rfc3339(),
        created_at: db_appointment.created_at,
    })
}

fn not_found(id: Uuid) -> CampusError {
    CampusError::NotFound(format!("Appointment with ID {} not found", id))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), AppError> {
    let allocation =
        appointment::create_appointment(&state.db_pool, &state.allocator, &payload).await?;

    info!(
        "Booked appointment {} after {} draw(s)",
        allocation.reference, allocation.attempts
    );
    let response = to_response(allocation.value, &state.time_zone)?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<ApiState>>,
    Path(reference): Path<String>,
) -> Result<Json<AppointmentResponse>, AppError> {
    // Malformed references never reach the database.
    let reference = ReferenceId::parse(&reference)?;

    let db_appointment = appointment::get_appointment_by_reference(&state.db_pool, &reference)
        .await?
        .ok_or_else(|| {
            CampusError::NotFound(format!("Appointment with reference {} not found", reference))
        })?;

    Ok(Json(to_response(db_appointment, &state.time_zone)?))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RescheduleAppointmentRequest>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let db_appointment =
        appointment::reschedule_appointment(&state.db_pool, id, payload.appointment_datetime)
            .await?
            .ok_or_else(|| not_found(id))?;

    Ok(Json(to_response(db_appointment, &state.time_zone)?))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAppointmentStatusRequest>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let db_appointment = appointment::update_status(&state.db_pool, id, payload.status)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(Json(to_response(db_appointment, &state.time_zone)?))
}
