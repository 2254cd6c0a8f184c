use tracing::{debug, warn};

use shared_models::appointment::AppointmentStatus;

use crate::models::AppointmentError;

/// What a cancellation request does to an appointment in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancellation {
    Apply,
    AlreadyCancelled,
}

#[derive(Debug, Default)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Setting the current status again is always accepted.
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition {} -> {}", current_status, new_status);

        if current_status == new_status {
            return Ok(());
        }

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Rescheduled,
            ],
            AppointmentStatus::Rescheduled => vec![
                AppointmentStatus::Scheduled,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Cancelling twice is a no-op; cancelling a completed visit is refused.
    pub fn plan_cancellation(
        &self,
        current_status: AppointmentStatus,
    ) -> Result<Cancellation, AppointmentError> {
        match current_status {
            AppointmentStatus::Cancelled => Ok(Cancellation::AlreadyCancelled),
            other => self
                .validate_status_transition(other, AppointmentStatus::Cancelled)
                .map(|_| Cancellation::Apply),
        }
    }
}
