use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CampusError;
use crate::reference::ReferenceId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = CampusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(CampusError::Validation(format!(
                "Unknown appointment status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub purpose: Option<String>,
    pub status: AppointmentStatus,
    pub appointment_datetime: DateTime<Utc>,
    pub reference_id: Option<ReferenceId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub purpose: Option<String>,
    pub appointment_datetime: DateTime<Utc>,
}

impl CreateAppointmentRequest {
    pub fn validate(&self) -> Result<(), CampusError> {
        if self.full_name.trim().is_empty() {
            return Err(CampusError::Validation("Full name is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(CampusError::Validation(format!(
                "Invalid email address: {}",
                self.email
            )));
        }
        if self.phone.trim().is_empty() {
            return Err(CampusError::Validation("Phone number is required".to_string()));
        }
        Ok(())
    }
}

/// Public view of an appointment; `appointment_datetime` is rendered in the
/// configured campus time zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub reference_id: Option<ReferenceId>,
    pub full_name: String,
    pub status: AppointmentStatus,
    pub appointment_datetime: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub appointment_datetime: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}
