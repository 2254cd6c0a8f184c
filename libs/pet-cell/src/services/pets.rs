use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use auth_cell::guard;
use shared_database::PetRepository;
use shared_models::auth::Actor;
use shared_models::error::AppError;
use shared_models::pet::Pet;

use crate::models::{CreatePetRequest, PetError, UpdatePetRequest};

pub struct PetService<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R> PetService<'a, R>
where
    R: PetRepository + ?Sized,
{
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub async fn create_pet(&self, actor: &Actor, request: CreatePetRequest) -> Result<Pet, AppError> {
        if request.name.trim().is_empty() || request.pet_type.trim().is_empty() {
            return Err(PetError::MissingPetFields.into());
        }
        let weight = request.weight.unwrap_or(0.0);
        if weight < 0.0 {
            return Err(PetError::InvalidWeight.into());
        }

        let owner_id = request
            .owner_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| actor.id.clone());
        guard::authorize_pet_create(actor, &owner_id)?;

        let now = Utc::now();
        let pet = Pet {
            id: Uuid::new_v4().to_string(),
            owner_id,
            name: request.name.trim().to_string(),
            pet_type: request.pet_type.trim().to_string(),
            breed: request.breed,
            date_of_birth: request.date_of_birth,
            weight,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create_pet(&pet).await?;
        info!("Created pet {} for owner {}", created.id, created.owner_id);
        Ok(created)
    }

    pub async fn get_pet(&self, actor: &Actor, pet_id: &str) -> Result<Pet, AppError> {
        let pet = self.repo.get_pet(pet_id).await?;
        guard::authorize_pet_read(actor, &pet)?;
        Ok(pet)
    }

    pub async fn update_pet(
        &self,
        actor: &Actor,
        pet_id: &str,
        request: UpdatePetRequest,
    ) -> Result<Pet, AppError> {
        let mut pet = self.repo.get_pet(pet_id).await?;
        guard::authorize_pet_write(actor, &pet)?;

        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(PetError::MissingPetFields.into());
            }
            pet.name = name.trim().to_string();
        }
        if let Some(pet_type) = request.pet_type {
            if pet_type.trim().is_empty() {
                return Err(PetError::MissingPetFields.into());
            }
            pet.pet_type = pet_type.trim().to_string();
        }
        if let Some(breed) = request.breed {
            pet.breed = breed;
        }
        if let Some(date_of_birth) = request.date_of_birth {
            pet.date_of_birth = Some(date_of_birth);
        }
        if let Some(weight) = request.weight {
            if weight < 0.0 {
                return Err(PetError::InvalidWeight.into());
            }
            pet.weight = weight;
        }
        pet.updated_at = Utc::now();

        Ok(self.repo.update_pet(&pet).await?)
    }

    pub async fn delete_pet(&self, actor: &Actor, pet_id: &str) -> Result<(), AppError> {
        let pet = self.repo.get_pet(pet_id).await?;
        guard::authorize_pet_write(actor, &pet)?;

        self.repo.delete_pet(pet_id).await?;
        info!("Deleted pet {}", pet_id);
        Ok(())
    }

    pub async fn list_client_pets(&self, actor: &Actor, client_id: &str) -> Result<Vec<Pet>, AppError> {
        guard::authorize_client_pets(actor, client_id)?;
        Ok(self.repo.list_pets_by_owner(client_id).await?)
    }
}
