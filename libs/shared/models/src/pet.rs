use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub pet_type: String,
    #[serde(default)]
    pub breed: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    #[serde(default)]
    pub weight: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A veterinary visit record attached to a pet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: String,
    pub pet_id: String,
    pub veterinarian_id: String,
    pub date_of_visit: DateTime<Utc>,
    pub reason_for_visit: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub medication_prescribed: Vec<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a scanned tag reveals about the pet and how to reach its owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QrEncodedContent {
    pub pet_name: String,
    pub pet_type: String,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub owner_phone: String,
    #[serde(default)]
    pub owner_email: String,
    #[serde(default)]
    pub owner_address: String,
    pub public_profile_url: String,
    #[serde(default)]
    pub emergency_contact: String,
    #[serde(default)]
    pub medical_alerts: Vec<String>,
}

/// The QR tag of a pet. `public_url` is the path of the unauthenticated
/// profile; deactivating the tag hides that profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetQrCode {
    pub id: String,
    pub pet_id: String,
    /// Base64 image, absent when no encoder is wired.
    pub qr_code_data: Option<String>,
    /// Text the tag carries when scanned.
    pub payload: String,
    pub public_url: String,
    pub encoded_content: QrEncodedContent,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicMedicalRecord {
    /// `YYYY-MM-DD`
    pub date_of_visit: String,
    pub reason_for_visit: String,
    pub diagnosis: String,
    pub medication_prescribed: Vec<String>,
}

/// Read-only view served to whoever scans a pet's tag.
#[derive(Debug, Clone, Serialize)]
pub struct PublicPetProfile {
    pub pet_name: String,
    pub pet_type: String,
    pub breed: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub weight: f64,
    pub owner_name: String,
    pub owner_phone: String,
    pub owner_email: String,
    pub owner_address: String,
    pub emergency_contact: String,
    pub medical_alerts: Vec<String>,
    pub medical_records: Vec<PublicMedicalRecord>,
}
