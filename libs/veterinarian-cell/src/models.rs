use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::RepositoryError;
use shared_models::appointment::TimeSlot;
use shared_models::clinic::{Veterinarian, WorkingHours};
use shared_models::error::AppError;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListVeterinariansQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListVeterinariansQuery {
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn limit(&self) -> usize {
        self.limit.filter(|l| *l > 0).unwrap_or(Self::DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetAvailabilityRequest {
    pub available_hours: Vec<WorkingHours>,
    pub clinic_address: Option<String>,
}

/// Public listing shape used when picking a veterinarian to book with.
#[derive(Debug, Clone, Serialize)]
pub struct VeterinarianSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub clinic_address: String,
    pub available_hours: Vec<WorkingHours>,
}

impl From<Veterinarian> for VeterinarianSummary {
    fn from(vet: Veterinarian) -> Self {
        Self {
            id: vet.id,
            name: vet.name,
            email: vet.email,
            phone: vet.phone,
            clinic_address: vet.clinic_address,
            available_hours: vet.available_hours,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    pub veterinarian_id: String,
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("Veterinarian not found")]
    VeterinarianNotFound,

    #[error("Date parameter is required")]
    MissingDate,

    #[error("Invalid date format. Use YYYY-MM-DD")]
    InvalidDate,

    #[error("Invalid working hours: {0}")]
    InvalidWindow(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::VeterinarianNotFound => AppError::NotFound(err.to_string()),
            AvailabilityError::MissingDate
            | AvailabilityError::InvalidDate
            | AvailabilityError::InvalidWindow(_) => AppError::ValidationError(err.to_string()),
            AvailabilityError::Repository(e) => e.into(),
        }
    }
}
