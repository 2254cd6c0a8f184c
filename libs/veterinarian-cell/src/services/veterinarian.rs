use tracing::{debug, info};

use auth_cell::guard;
use shared_database::{ProfileRepository, RepositoryError};
use shared_models::auth::Actor;
use shared_models::clinic::{Veterinarian, WorkingHours};
use shared_models::error::AppError;

use crate::models::{
    AvailabilityError, ListVeterinariansQuery, SetAvailabilityRequest, VeterinarianSummary,
};
use crate::services::availability::{is_known_day, normalize_day, parse_time_of_day};

pub struct VeterinarianService<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R> VeterinarianService<'a, R>
where
    R: ProfileRepository + ?Sized,
{
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub async fn list_veterinarians(
        &self,
        query: &ListVeterinariansQuery,
    ) -> Result<Vec<VeterinarianSummary>, AppError> {
        let vets = self.repo.list_veterinarians().await?;
        debug!("Listing {} veterinarians", vets.len());

        Ok(vets
            .into_iter()
            .skip(query.offset())
            .take(query.limit())
            .map(VeterinarianSummary::from)
            .collect())
    }

    /// Replaces the veterinarian's working hours wholesale. Day names are
    /// stored in canonical form; every window must parse and be non-empty.
    pub async fn set_availability(
        &self,
        actor: &Actor,
        veterinarian_id: &str,
        request: SetAvailabilityRequest,
    ) -> Result<Veterinarian, AppError> {
        guard::authorize_veterinarian_scope(actor, veterinarian_id)?;

        let hours = validate_windows(&request.available_hours)?;

        let mut vet = self
            .repo
            .get_veterinarian(veterinarian_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => AvailabilityError::VeterinarianNotFound,
                other => AvailabilityError::Repository(other),
            })?;

        vet.available_hours = hours;
        if let Some(address) = request.clinic_address.filter(|a| !a.is_empty()) {
            vet.clinic_address = address;
        }

        let updated = self.repo.update_veterinarian(&vet).await?;
        info!(
            "Veterinarian {} now has {} working-hour windows",
            updated.id,
            updated.available_hours.len()
        );
        Ok(updated)
    }
}

fn validate_windows(windows: &[WorkingHours]) -> Result<Vec<WorkingHours>, AvailabilityError> {
    windows
        .iter()
        .map(|window| {
            if !is_known_day(&window.day_of_week) {
                return Err(AvailabilityError::InvalidWindow(format!(
                    "unknown day '{}'",
                    window.day_of_week
                )));
            }
            match (parse_time_of_day(&window.start), parse_time_of_day(&window.end)) {
                (Some(start), Some(end)) if end > start => Ok(WorkingHours::new(
                    &normalize_day(&window.day_of_week),
                    window.start.trim(),
                    window.end.trim(),
                )),
                (Some(_), Some(_)) => Err(AvailabilityError::InvalidWindow(format!(
                    "{} must end after it starts",
                    window.day_of_week
                ))),
                _ => Err(AvailabilityError::InvalidWindow(format!(
                    "times for {} must be HH:MM",
                    window.day_of_week
                ))),
            }
        })
        .collect()
}
