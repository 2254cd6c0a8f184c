use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use auth_cell::guard;
use shared_database::{
    MedicalRecordRepository, PetRepository, ProfileRepository, QrCodeRepository, RepositoryError,
};
use shared_models::auth::Actor;
use shared_models::error::AppError;
use shared_models::pet::{
    Pet, PetQrCode, PublicMedicalRecord, PublicPetProfile, QrEncodedContent,
};

use crate::models::{PetError, UpdateQrCodeRequest};

/// Path prefix of every public profile link.
pub const PUBLIC_PROFILE_PREFIX: &str = "/public/pets/";

/// Renders the text a tag carries into an image.
pub trait QrImageEncoder: Send + Sync {
    /// Base64 image for `payload`, or `None` when no image is produced.
    fn encode(&self, payload: &str) -> Option<String>;
}

/// Keeps only the scan text; clients render the tag themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct PayloadOnlyEncoder;

impl QrImageEncoder for PayloadOnlyEncoder {
    fn encode(&self, _payload: &str) -> Option<String> {
        None
    }
}

pub struct QrCodeService<'a, R: ?Sized> {
    repo: &'a R,
    encoder: &'a dyn QrImageEncoder,
}

impl<'a, R> QrCodeService<'a, R>
where
    R: PetRepository + ProfileRepository + MedicalRecordRepository + QrCodeRepository + ?Sized,
{
    pub fn new(repo: &'a R, encoder: &'a dyn QrImageEncoder) -> Self {
        Self { repo, encoder }
    }

    /// Returns the pet's tag, creating it on first use. The flag is `true`
    /// when this call created it. `link_base` is prepended to the public path
    /// in the scan text.
    pub async fn generate(
        &self,
        actor: &Actor,
        pet_id: &str,
        link_base: &str,
    ) -> Result<(PetQrCode, bool), AppError> {
        let pet = self.repo.get_pet(pet_id).await?;
        guard::authorize_pet_write(actor, &pet)?;

        if let Some(existing) = self.existing(pet_id).await? {
            debug!("Pet {} already has QR code {}", pet_id, existing.id);
            return Ok((existing, false));
        }

        let owner = match self.repo.get_client(&pet.owner_id).await {
            Ok(owner) => owner,
            Err(RepositoryError::NotFound(_)) => return Err(PetError::OwnerNotFound.into()),
            Err(e) => return Err(e.into()),
        };

        let public_url = format!("{}{}", PUBLIC_PROFILE_PREFIX, Uuid::new_v4());
        let encoded_content = QrEncodedContent {
            pet_name: pet.name.clone(),
            pet_type: pet.pet_type.clone(),
            owner_name: owner.name,
            owner_phone: owner.phone,
            owner_email: owner.email,
            owner_address: owner.address,
            public_profile_url: format!("{}{}", link_base.trim_end_matches('/'), public_url),
            emergency_contact: String::new(),
            medical_alerts: Vec::new(),
        };

        let now = Utc::now();
        let mut qr_code = PetQrCode {
            id: Uuid::new_v4().to_string(),
            pet_id: pet.id,
            qr_code_data: None,
            payload: String::new(),
            public_url,
            encoded_content,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.render(&mut qr_code);

        match self.repo.create_qr_code(&qr_code).await {
            Ok(created) => {
                info!("Created QR code {} for pet {}", created.id, created.pet_id);
                Ok((created, true))
            }
            // A concurrent request created it first.
            Err(RepositoryError::Conflict(_)) => {
                Ok((self.repo.get_qr_code_by_pet(pet_id).await?, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, actor: &Actor, pet_id: &str) -> Result<PetQrCode, AppError> {
        let pet = self.repo.get_pet(pet_id).await?;
        guard::authorize_pet_read(actor, &pet)?;

        Ok(self.repo.get_qr_code_by_pet(pet_id).await?)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        pet_id: &str,
        request: UpdateQrCodeRequest,
    ) -> Result<PetQrCode, AppError> {
        let pet = self.repo.get_pet(pet_id).await?;
        guard::authorize_pet_write(actor, &pet)?;

        let mut qr_code = self.repo.get_qr_code_by_pet(pet_id).await?;
        if let Some(contact) = request.emergency_contact {
            qr_code.encoded_content.emergency_contact = contact.trim().to_string();
        }
        if let Some(alerts) = request.medical_alerts {
            qr_code.encoded_content.medical_alerts = alerts
                .into_iter()
                .map(|alert| alert.trim().to_string())
                .filter(|alert| !alert.is_empty())
                .collect();
        }
        if let Some(is_active) = request.is_active {
            qr_code.is_active = is_active;
        }
        refresh_pet_fields(&mut qr_code.encoded_content, &pet);
        self.render(&mut qr_code);
        qr_code.updated_at = Utc::now();

        Ok(self.repo.update_qr_code(&qr_code).await?)
    }

    /// Soft delete: the tag stays but its public profile stops resolving.
    pub async fn deactivate(&self, actor: &Actor, pet_id: &str) -> Result<PetQrCode, AppError> {
        let pet = self.repo.get_pet(pet_id).await?;
        guard::authorize_pet_write(actor, &pet)?;

        let mut qr_code = self.repo.get_qr_code_by_pet(pet_id).await?;
        qr_code.is_active = false;
        qr_code.updated_at = Utc::now();

        let saved = self.repo.update_qr_code(&qr_code).await?;
        info!("Deactivated QR code {} of pet {}", saved.id, pet_id);
        Ok(saved)
    }

    /// Unauthenticated lookup by the token at the end of a profile link.
    pub async fn public_profile(&self, public_url: &str) -> Result<PublicPetProfile, AppError> {
        let token = public_url.rsplit('/').next().unwrap_or_default().trim();
        if token.is_empty() {
            return Err(PetError::ProfileNotFound.into());
        }
        let normalized = format!("{}{}", PUBLIC_PROFILE_PREFIX, token);

        let qr_code = self
            .repo
            .get_active_qr_code_by_public_url(&normalized)
            .await
            .map_err(profile_not_found)?;
        let pet = self.repo.get_pet(&qr_code.pet_id).await.map_err(profile_not_found)?;
        let records = self.repo.list_medical_records(&pet.id).await?;

        let content = qr_code.encoded_content;
        Ok(PublicPetProfile {
            pet_name: pet.name,
            pet_type: pet.pet_type,
            breed: pet.breed,
            date_of_birth: pet.date_of_birth,
            weight: pet.weight,
            owner_name: content.owner_name,
            owner_phone: content.owner_phone,
            owner_email: content.owner_email,
            owner_address: content.owner_address,
            emergency_contact: content.emergency_contact,
            medical_alerts: content.medical_alerts,
            medical_records: records
                .into_iter()
                .map(|record| PublicMedicalRecord {
                    date_of_visit: record.date_of_visit.format("%Y-%m-%d").to_string(),
                    reason_for_visit: record.reason_for_visit,
                    diagnosis: record.diagnosis,
                    medication_prescribed: record.medication_prescribed,
                })
                .collect(),
        })
    }

    async fn existing(&self, pet_id: &str) -> Result<Option<PetQrCode>, AppError> {
        match self.repo.get_qr_code_by_pet(pet_id).await {
            Ok(qr_code) => Ok(Some(qr_code)),
            Err(RepositoryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn render(&self, qr_code: &mut PetQrCode) {
        qr_code.payload = scan_text(&qr_code.encoded_content);
        qr_code.qr_code_data = self.encoder.encode(&qr_code.payload);
    }
}

fn refresh_pet_fields(content: &mut QrEncodedContent, pet: &Pet) {
    content.pet_name = pet.name.clone();
    content.pet_type = pet.pet_type.clone();
}

/// What a phone shows when the tag is scanned.
pub fn scan_text(content: &QrEncodedContent) -> String {
    let mut text = format!(
        "Pet: {}\nOwner: {}\nPhone: {}\nAddress: {}",
        content.pet_name, content.owner_name, content.owner_phone, content.owner_address
    );
    if !content.emergency_contact.is_empty() {
        text.push_str(&format!("\nEmergency: {}", content.emergency_contact));
    }
    if !content.medical_alerts.is_empty() {
        text.push_str(&format!("\nAlerts: {}", content.medical_alerts.join(", ")));
    }
    text.push_str(&format!("\nProfile: {}", content.public_profile_url));
    text
}

fn profile_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound(_) => PetError::ProfileNotFound.into(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_text_lists_alerts_only_when_present() {
        let mut content = QrEncodedContent {
            pet_name: "Rex".into(),
            pet_type: "dog".into(),
            owner_name: "Ana".into(),
            owner_phone: "555-0101".into(),
            owner_address: "1 Main St".into(),
            public_profile_url: "https://clinic.test/public/pets/abc".into(),
            ..Default::default()
        };
        assert_eq!(
            scan_text(&content),
            "Pet: Rex\nOwner: Ana\nPhone: 555-0101\nAddress: 1 Main St\nProfile: https://clinic.test/public/pets/abc"
        );

        content.medical_alerts = vec!["Diabetic".into(), "Penicillin allergy".into()];
        assert!(scan_text(&content).contains("\nAlerts: Diabetic, Penicillin allergy\n"));
    }
}
