use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use shared_database::RepositoryError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePetRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub pet_type: String,
    #[serde(default)]
    pub breed: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub weight: Option<f64>,
    /// Defaults to the caller.
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePetRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub pet_type: Option<String>,
    pub breed: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMedicalRecordRequest {
    /// Defaults to now.
    pub date_of_visit: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason_for_visit: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub medication_prescribed: Vec<String>,
    #[serde(default)]
    pub notes: String,
    /// Only honored for admins; veterinarians always author their own records.
    pub veterinarian_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMedicalRecordRequest {
    pub date_of_visit: Option<DateTime<Utc>>,
    pub reason_for_visit: Option<String>,
    pub diagnosis: Option<String>,
    pub medication_prescribed: Option<Vec<String>>,
    pub notes: Option<String>,
}

/// Partial update of a pet's QR tag. Changing the content re-renders the tag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQrCodeRequest {
    pub emergency_contact: Option<String>,
    pub medical_alerts: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Error)]
pub enum PetError {
    #[error("Name and type are required")]
    MissingPetFields,

    #[error("Weight cannot be negative")]
    InvalidWeight,

    #[error("Reason for visit is required")]
    MissingReason,

    #[error("Only veterinarians can create medical records")]
    RecordAuthorRequired,

    #[error("Owner not found")]
    OwnerNotFound,

    #[error("Pet profile not found")]
    ProfileNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<PetError> for AppError {
    fn from(err: PetError) -> Self {
        match err {
            PetError::MissingPetFields | PetError::InvalidWeight | PetError::MissingReason => {
                AppError::ValidationError(err.to_string())
            }
            PetError::RecordAuthorRequired => AppError::Forbidden(err.to_string()),
            PetError::OwnerNotFound | PetError::ProfileNotFound => AppError::NotFound(err.to_string()),
            PetError::Repository(e) => e.into(),
        }
    }
}
