use std::sync::Arc;

use assert_matches::assert_matches;
use axum::extract::{Extension, Json, Path, Query, State};
use chrono::{TimeZone, Utc};

use shared_database::{AppState, AppointmentRepository, ProfileRepository};
use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::auth::{Actor, Role};
use shared_models::clinic::WorkingHours;
use shared_models::error::AppError;
use shared_utils::test_utils::{Fixtures, TestConfig};
use veterinarian_cell::handlers::{get_available_slots, list_veterinarians, set_availability};
use veterinarian_cell::models::{AvailabilityQuery, ListVeterinariansQuery, SetAvailabilityRequest};

fn create_test_actor(id: &str, role: Role) -> Extension<Actor> {
    Extension(Actor::new(id, None, role))
}

async fn seeded_state() -> Arc<AppState> {
    let state = TestConfig::default().to_state();
    let mut vet = Fixtures::veterinarian("vet-1");
    vet.available_hours = vec![WorkingHours::new("Mon", "09:00", "10:00")];
    state.store.create_veterinarian(&vet).await.unwrap();
    state
}

fn date_query(date: &str) -> Query<AvailabilityQuery> {
    Query(AvailabilityQuery {
        date: Some(date.to_string()),
    })
}

#[tokio::test]
async fn test_slots_reflect_existing_appointments() {
    let state = seeded_state().await;
    let start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 30, 0).unwrap();
    state
        .store
        .create_appointment(&Appointment {
            id: "appt-1".into(),
            client_id: "client-1".into(),
            veterinarian_id: "vet-1".into(),
            pet_id: "pet-1".into(),
            appointment_date: start,
            duration_minutes: 30,
            reason: "Vaccination".into(),
            status: AppointmentStatus::Scheduled,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

    let Json(body) = get_available_slots(
        State(state),
        create_test_actor("client-1", Role::Client),
        Path("vet-1".to_string()),
        date_query("2024-06-03"),
    )
    .await
    .unwrap();

    let slots = body["data"]["slots"].as_array().unwrap();
    assert_eq!(body["data"]["date"], "2024-06-03");
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0]["available"], true);
    assert_eq!(slots[1]["available"], false);
    assert_eq!(slots[1]["start_time"], "2024-06-03T09:30:00Z");
}

#[tokio::test]
async fn test_slots_for_day_without_hours_are_empty() {
    let state = seeded_state().await;

    let Json(body) = get_available_slots(
        State(state),
        create_test_actor("client-1", Role::Client),
        Path("vet-1".to_string()),
        date_query("2024-06-04"),
    )
    .await
    .unwrap();

    assert!(body["data"]["slots"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_slots_validate_date_and_veterinarian() {
    let state = seeded_state().await;

    let bad_date = get_available_slots(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Path("vet-1".to_string()),
        date_query("June 3rd"),
    )
    .await;
    assert_matches!(bad_date, Err(AppError::ValidationError(_)));

    let missing_date = get_available_slots(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Path("vet-1".to_string()),
        Query(AvailabilityQuery { date: None }),
    )
    .await;
    assert_matches!(missing_date, Err(AppError::ValidationError(_)));

    let unknown_vet = get_available_slots(
        State(state),
        create_test_actor("client-1", Role::Client),
        Path("vet-404".to_string()),
        date_query("2024-06-03"),
    )
    .await;
    assert_matches!(unknown_vet, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_set_availability_replaces_hours() {
    let state = seeded_state().await;
    let request = SetAvailabilityRequest {
        available_hours: vec![
            WorkingHours::new("tuesday", "08:00", "09:00"),
            WorkingHours::new("Thu", "14:00", "15:30"),
        ],
        clinic_address: Some("9 New Clinic Way".to_string()),
    };

    let Json(body) = set_availability(
        State(state.clone()),
        create_test_actor("vet-1", Role::Veterinarian),
        Path("vet-1".to_string()),
        Json(request),
    )
    .await
    .unwrap();
    assert_eq!(body["data"]["clinic_address"], "9 New Clinic Way");

    let vet = state.store.get_veterinarian("vet-1").await.unwrap();
    assert_eq!(
        vet.available_hours,
        vec![
            WorkingHours::new("Tue", "08:00", "09:00"),
            WorkingHours::new("Thu", "14:00", "15:30"),
        ]
    );

    // The old Monday window is gone.
    let Json(body) = get_available_slots(
        State(state),
        create_test_actor("client-1", Role::Client),
        Path("vet-1".to_string()),
        date_query("2024-06-03"),
    )
    .await
    .unwrap();
    assert!(body["data"]["slots"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_set_availability_is_limited_to_the_vet_and_admins() {
    let state = seeded_state().await;
    let request = || SetAvailabilityRequest {
        available_hours: vec![WorkingHours::new("Mon", "09:00", "17:00")],
        clinic_address: None,
    };

    for actor in [
        create_test_actor("vet-2", Role::Veterinarian),
        create_test_actor("client-1", Role::Client),
        create_test_actor("vet-1", Role::Unrecognized("authenticated".into())),
    ] {
        let result = set_availability(
            State(state.clone()),
            actor,
            Path("vet-1".to_string()),
            Json(request()),
        )
        .await;
        assert_matches!(result, Err(AppError::Forbidden(_)));
    }

    let admin = set_availability(
        State(state),
        create_test_actor("admin-1", Role::Admin),
        Path("vet-1".to_string()),
        Json(request()),
    )
    .await;
    assert!(admin.is_ok());
}

#[tokio::test]
async fn test_list_veterinarians() {
    let state = seeded_state().await;
    state
        .store
        .create_veterinarian(&Fixtures::veterinarian("vet-2"))
        .await
        .unwrap();

    let Json(body) = list_veterinarians(
        State(state),
        create_test_actor("client-1", Role::Client),
        Query(ListVeterinariansQuery::default()),
    )
    .await
    .unwrap();

    let vets = body["data"].as_array().unwrap();
    assert_eq!(vets.len(), 2);
    assert_eq!(vets[0]["id"], "vet-1");
    assert!(vets[0].get("role").is_none());
}

#[tokio::test]
async fn test_list_veterinarians_pages_ten_by_default() {
    let state = seeded_state().await;
    for n in 2..=12 {
        state
            .store
            .create_veterinarian(&Fixtures::veterinarian(&format!("vet-{:02}", n)))
            .await
            .unwrap();
    }

    let Json(body) = list_veterinarians(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Query(ListVeterinariansQuery::default()),
    )
    .await
    .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 10);

    let Json(body) = list_veterinarians(
        State(state),
        create_test_actor("client-1", Role::Client),
        Query(ListVeterinariansQuery {
            limit: None,
            offset: Some(10),
        }),
    )
    .await
    .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}
