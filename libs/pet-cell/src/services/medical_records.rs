use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use auth_cell::guard;
use shared_database::{MedicalRecordRepository, PetRepository};
use shared_models::auth::{Actor, Role};
use shared_models::error::AppError;
use shared_models::pet::MedicalRecord;

use crate::models::{CreateMedicalRecordRequest, PetError, UpdateMedicalRecordRequest};

pub struct MedicalRecordService<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R> MedicalRecordService<'a, R>
where
    R: PetRepository + MedicalRecordRepository + ?Sized,
{
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub async fn create_record(
        &self,
        actor: &Actor,
        pet_id: &str,
        request: CreateMedicalRecordRequest,
    ) -> Result<MedicalRecord, AppError> {
        let veterinarian_id = match &actor.role {
            Role::Veterinarian => actor.id.clone(),
            Role::Admin => request
                .veterinarian_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| actor.id.clone()),
            _ => return Err(PetError::RecordAuthorRequired.into()),
        };

        if request.reason_for_visit.trim().is_empty() {
            return Err(PetError::MissingReason.into());
        }

        let pet = self.repo.get_pet(pet_id).await?;

        let now = Utc::now();
        let record = MedicalRecord {
            id: Uuid::new_v4().to_string(),
            pet_id: pet.id,
            veterinarian_id,
            date_of_visit: request.date_of_visit.unwrap_or(now),
            reason_for_visit: request.reason_for_visit.trim().to_string(),
            diagnosis: request.diagnosis,
            medication_prescribed: request.medication_prescribed,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create_medical_record(&record).await?;
        info!("Created medical record {} for pet {}", created.id, created.pet_id);
        Ok(created)
    }

    pub async fn list_records(&self, actor: &Actor, pet_id: &str) -> Result<Vec<MedicalRecord>, AppError> {
        let pet = self.repo.get_pet(pet_id).await?;
        guard::authorize_medical_record_read(actor, &pet)?;
        Ok(self.repo.list_medical_records(pet_id).await?)
    }

    pub async fn get_record(&self, actor: &Actor, record_id: &str) -> Result<MedicalRecord, AppError> {
        let record = self.repo.get_medical_record(record_id).await?;
        let pet = self.repo.get_pet(&record.pet_id).await?;
        guard::authorize_medical_record_read(actor, &pet)?;
        Ok(record)
    }

    pub async fn update_record(
        &self,
        actor: &Actor,
        record_id: &str,
        request: UpdateMedicalRecordRequest,
    ) -> Result<MedicalRecord, AppError> {
        let mut record = self.repo.get_medical_record(record_id).await?;
        guard::authorize_medical_record_write(actor, &record)?;

        if let Some(date_of_visit) = request.date_of_visit {
            record.date_of_visit = date_of_visit;
        }
        if let Some(reason) = request.reason_for_visit {
            if reason.trim().is_empty() {
                return Err(PetError::MissingReason.into());
            }
            record.reason_for_visit = reason.trim().to_string();
        }
        if let Some(diagnosis) = request.diagnosis {
            record.diagnosis = diagnosis;
        }
        if let Some(medication) = request.medication_prescribed {
            record.medication_prescribed = medication;
        }
        if let Some(notes) = request.notes {
            record.notes = notes;
        }
        record.updated_at = Utc::now();

        Ok(self.repo.update_medical_record(&record).await?)
    }

    pub async fn delete_record(&self, actor: &Actor, record_id: &str) -> Result<(), AppError> {
        let record = self.repo.get_medical_record(record_id).await?;
        guard::authorize_medical_record_write(actor, &record)?;

        self.repo.delete_medical_record(record_id).await?;
        info!("Deleted medical record {}", record_id);
        Ok(())
    }
}
