use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use shared_database::RepositoryError;
use shared_models::appointment::AppointmentStatus;
use shared_models::error::AppError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking request. Timestamps arrive as RFC 3339 strings so malformed values
/// surface as validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAppointmentRequest {
    #[serde(default)]
    pub veterinarian_id: String,
    #[serde(default)]
    pub pet_id: String,
    pub appointment_date: Option<String>,
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub reason: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub appointment_date: Option<String>,
    pub duration_minutes: Option<i32>,
    pub reason: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub client_id: Option<String>,
    pub veterinarian_id: Option<String>,
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppointmentError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| AppointmentError::InvalidDate)
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid appointment_date, expected RFC 3339 timestamp")]
    InvalidDate,

    #[error("duration_minutes must be positive")]
    InvalidDuration,

    #[error("Invalid status")]
    InvalidStatus,

    #[error("Only clients can book appointments")]
    BookingNotAllowed,

    #[error("Selected time is not available")]
    SlotNotAvailable,

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::MissingFields
            | AppointmentError::InvalidDate
            | AppointmentError::InvalidDuration
            | AppointmentError::InvalidStatus => AppError::ValidationError(err.to_string()),
            AppointmentError::BookingNotAllowed => AppError::Forbidden(err.to_string()),
            AppointmentError::SlotNotAvailable
            | AppointmentError::InvalidStatusTransition { .. } => AppError::Conflict(err.to_string()),
            AppointmentError::Repository(e) => e.into(),
        }
    }
}
