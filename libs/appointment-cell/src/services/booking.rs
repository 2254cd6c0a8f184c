use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use auth_cell::guard;
use shared_database::locks::KeyedLocks;
use shared_database::{AppState, AppointmentQuery, RepositoryError, Store};
use shared_models::appointment::{Appointment, AppointmentStatus, DEFAULT_DURATION_MINUTES};
use shared_models::auth::{Actor, Role};
use shared_models::error::AppError;
use veterinarian_cell::services::availability::{is_bookable, AvailabilityService};

use crate::models::{
    parse_timestamp, AppointmentError, AppointmentListQuery, CreateAppointmentRequest,
    UpdateAppointmentRequest,
};
use crate::services::lifecycle::{AppointmentLifecycleService, Cancellation};

pub struct AppointmentBookingService<'a> {
    store: &'a dyn Store,
    locks: &'a KeyedLocks,
    lifecycle_service: AppointmentLifecycleService,
}

impl<'a> AppointmentBookingService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            store: state.store.as_ref(),
            locks: &state.booking_locks,
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    /// Books a slot for a pet. The requested start must equal the start of an
    /// available slot; validation and insert run under the veterinarian's lock.
    pub async fn book_appointment(
        &self,
        actor: &Actor,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppError> {
        let missing_fields = request.veterinarian_id.is_empty()
            || request.pet_id.is_empty()
            || request.reason.trim().is_empty();
        let raw_date = match request.appointment_date.as_deref().map(str::trim) {
            Some(date) if !date.is_empty() && !missing_fields => date,
            _ => return Err(AppointmentError::MissingFields.into()),
        };
        let requested_start = parse_timestamp(raw_date)?;

        if !matches!(actor.role, Role::Admin | Role::Client) {
            warn!("{} with role {} tried to book an appointment", actor.id, actor.role);
            return Err(AppointmentError::BookingNotAllowed.into());
        }

        let pet = self.store.get_pet(&request.pet_id).await?;
        guard::authorize_booking(actor, &pet)?;

        self.store.get_veterinarian(&request.veterinarian_id).await?;

        let duration_minutes = request
            .duration_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(DEFAULT_DURATION_MINUTES);

        let _booking_guard = self
            .locks
            .acquire(&veterinarian_lock(&request.veterinarian_id))
            .await;

        let slots = AvailabilityService::new(self.store)
            .compute_slots(&request.veterinarian_id, requested_start.date_naive())
            .await?;
        if !is_bookable(&slots, requested_start) {
            debug!(
                "Requested start {} is not an open slot for veterinarian {}",
                requested_start, request.veterinarian_id
            );
            return Err(AppointmentError::SlotNotAvailable.into());
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4().to_string(),
            client_id: pet.owner_id.clone(),
            veterinarian_id: request.veterinarian_id,
            pet_id: pet.id,
            appointment_date: requested_start,
            duration_minutes,
            reason: request.reason.trim().to_string(),
            status: AppointmentStatus::Scheduled,
            notes: request.notes.filter(|n| !n.is_empty()),
            created_at: now,
            updated_at: now,
        };

        let created = self
            .store
            .create_appointment(&appointment)
            .await
            .map_err(slot_conflict)?;

        info!(
            "Booked appointment {} with veterinarian {} at {}",
            created.id, created.veterinarian_id, created.appointment_date
        );
        Ok(created)
    }

    pub async fn list_appointments(
        &self,
        actor: &Actor,
        query: AppointmentListQuery,
    ) -> Result<Vec<Appointment>, AppError> {
        let filter = match &actor.role {
            Role::Client => AppointmentQuery {
                client_id: Some(actor.id.clone()),
                veterinarian_id: None,
            },
            Role::Veterinarian => AppointmentQuery {
                client_id: None,
                veterinarian_id: Some(actor.id.clone()),
            },
            Role::Admin => AppointmentQuery {
                client_id: query.client_id.filter(|id| !id.is_empty()),
                veterinarian_id: query.veterinarian_id.filter(|id| !id.is_empty()),
            },
            Role::Unrecognized(_) => return Err(guard::forbidden(actor, "appointment listing")),
        };

        Ok(self.store.list_appointments(&filter).await?)
    }

    pub async fn get_appointment(
        &self,
        actor: &Actor,
        appointment_id: &str,
    ) -> Result<Appointment, AppError> {
        let appointment = self.store.get_appointment(appointment_id).await?;
        guard::authorize_appointment(actor, &appointment)?;
        Ok(appointment)
    }

    /// Applies a partial update. Moving a live appointment re-validates the new
    /// start against the calendar, ignoring the appointment's own interval.
    ///
    /// The row is read and written back under the appointment's lock, so a
    /// concurrent cancel or edit is never overwritten with stale fields.
    pub async fn update_appointment(
        &self,
        actor: &Actor,
        appointment_id: &str,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppError> {
        let _row_guard = self.locks.acquire(&appointment_lock(appointment_id)).await;
        let current = self.get_appointment(actor, appointment_id).await?;
        let mut updated = current.clone();

        if let Some(raw_date) = request.appointment_date.as_deref().filter(|d| !d.trim().is_empty()) {
            updated.appointment_date = parse_timestamp(raw_date)?;
        }
        if let Some(minutes) = request.duration_minutes {
            if minutes <= 0 {
                return Err(AppointmentError::InvalidDuration.into());
            }
            updated.duration_minutes = minutes;
        }
        if let Some(reason) = request.reason.filter(|r| !r.trim().is_empty()) {
            updated.reason = reason.trim().to_string();
        }
        if let Some(raw_status) = request.status.filter(|s| !s.is_empty()) {
            let status = raw_status
                .parse::<AppointmentStatus>()
                .map_err(|_| AppointmentError::InvalidStatus)?;
            self.lifecycle_service
                .validate_status_transition(current.status, status)?;
            updated.status = status;
        }
        if let Some(notes) = request.notes {
            updated.notes = Some(notes).filter(|n| !n.is_empty());
        }

        let moved = updated.appointment_date != current.appointment_date
            || updated.duration_minutes != current.duration_minutes;

        let _booking_guard = if moved && updated.occupies_calendar() {
            let lock = self
                .locks
                .acquire(&veterinarian_lock(&updated.veterinarian_id))
                .await;
            let slots = AvailabilityService::new(self.store)
                .compute_slots_excluding(
                    &updated.veterinarian_id,
                    updated.appointment_date.date_naive(),
                    Some(&updated.id),
                )
                .await?;
            if !is_bookable(&slots, updated.appointment_date) {
                return Err(AppointmentError::SlotNotAvailable.into());
            }
            Some(lock)
        } else {
            None
        };

        updated.updated_at = Utc::now();
        let saved = self
            .store
            .update_appointment(&updated)
            .await
            .map_err(slot_conflict)?;

        info!("Updated appointment {} (status {})", saved.id, saved.status);
        Ok(saved)
    }

    /// Soft cancel: the record stays and its status becomes `cancelled`.
    pub async fn cancel_appointment(
        &self,
        actor: &Actor,
        appointment_id: &str,
    ) -> Result<Appointment, AppError> {
        let _row_guard = self.locks.acquire(&appointment_lock(appointment_id)).await;
        let mut appointment = self.get_appointment(actor, appointment_id).await?;

        match self.lifecycle_service.plan_cancellation(appointment.status)? {
            Cancellation::AlreadyCancelled => {
                debug!("Appointment {} already cancelled", appointment.id);
                Ok(appointment)
            }
            Cancellation::Apply => {
                appointment.status = AppointmentStatus::Cancelled;
                appointment.updated_at = Utc::now();
                let saved = self.store.update_appointment(&appointment).await?;
                info!("Cancelled appointment {}", saved.id);
                Ok(saved)
            }
        }
    }
}

// Row locks are always taken before calendar locks.
fn appointment_lock(appointment_id: &str) -> String {
    format!("appointment:{}", appointment_id)
}

fn veterinarian_lock(veterinarian_id: &str) -> String {
    format!("veterinarian:{}", veterinarian_id)
}

/// Storage-level uniqueness failures read as an unavailable slot.
fn slot_conflict(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::Conflict(_) => AppointmentError::SlotNotAvailable.into(),
        other => other.into(),
    }
}
