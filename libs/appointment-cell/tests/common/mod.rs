#![allow(dead_code)]

use std::sync::Arc;

use axum::extract::Extension;

use appointment_cell::models::CreateAppointmentRequest;
use shared_database::{AppState, PetRepository, ProfileRepository};
use shared_models::auth::{Actor, Role};
use shared_models::clinic::WorkingHours;
use shared_utils::test_utils::{Fixtures, TestConfig};

/// 2024-06-03 is a Monday.
pub const MONDAY: &str = "2024-06-03";

pub fn at(time: &str) -> String {
    format!("{}T{}:00Z", MONDAY, time)
}

pub fn create_test_actor(id: &str, role: Role) -> Extension<Actor> {
    Extension(Actor::new(id, Some(format!("{}@example.com", id)), role))
}

/// Veterinarian `vet-1` working Monday 09:00-12:00, client `client-1` owning
/// `pet-1`, client `client-2` owning `pet-2`.
pub async fn seeded_state() -> Arc<AppState> {
    let state = TestConfig::default().to_state();

    let mut vet = Fixtures::veterinarian("vet-1");
    vet.available_hours = vec![WorkingHours::new("Mon", "09:00", "12:00")];
    state.store.create_veterinarian(&vet).await.unwrap();

    state.store.create_client(&Fixtures::client("client-1")).await.unwrap();
    state.store.create_client(&Fixtures::client("client-2")).await.unwrap();
    state.store.create_pet(&Fixtures::pet("pet-1", "client-1")).await.unwrap();
    state.store.create_pet(&Fixtures::pet("pet-2", "client-2")).await.unwrap();

    state
}

pub fn booking(pet_id: &str, time: &str) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        veterinarian_id: "vet-1".to_string(),
        pet_id: pet_id.to_string(),
        appointment_date: Some(at(time)),
        duration_minutes: None,
        reason: "Annual checkup".to_string(),
        notes: None,
    }
}
