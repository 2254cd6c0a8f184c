mod common;

use assert_matches::assert_matches;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};

use appointment_cell::handlers::*;
use appointment_cell::models::{AppointmentListQuery, UpdateAppointmentRequest};
use shared_database::AppointmentRepository;
use shared_models::appointment::AppointmentStatus;
use shared_models::auth::Role;
use shared_models::error::AppError;

use common::{at, booking, create_test_actor, seeded_state};

async fn book_as_client_1(state: &std::sync::Arc<shared_database::AppState>, time: &str) -> String {
    let (_, Json(body)) = book_appointment(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Json(booking("pet-1", time)),
    )
    .await
    .unwrap();
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_book_appointment_success() {
    let state = seeded_state().await;

    let (status, Json(body)) = book_appointment(
        State(state),
        create_test_actor("client-1", Role::Client),
        Json(booking("pet-1", "09:00")),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "scheduled");
    assert_eq!(body["data"]["duration_minutes"], 30);
    assert_eq!(body["data"]["client_id"], "client-1");
    assert_eq!(body["data"]["appointment_date"], at("09:00"));
}

#[tokio::test]
async fn test_book_appointment_missing_fields() {
    let state = seeded_state().await;
    let mut request = booking("pet-1", "09:00");
    request.reason = "   ".to_string();

    let result = book_appointment(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Json(request),
    )
    .await;
    assert_matches!(result, Err(AppError::ValidationError(msg)) if msg == "Missing required fields");

    let mut request = booking("pet-1", "09:00");
    request.appointment_date = Some("next monday".to_string());
    let result = book_appointment(
        State(state),
        create_test_actor("client-1", Role::Client),
        Json(request),
    )
    .await;
    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_book_appointment_role_and_ownership() {
    let state = seeded_state().await;

    let vet = book_appointment(
        State(state.clone()),
        create_test_actor("vet-1", Role::Veterinarian),
        Json(booking("pet-1", "09:00")),
    )
    .await;
    assert_matches!(vet, Err(AppError::Forbidden(_)));

    let stranger = book_appointment(
        State(state.clone()),
        create_test_actor("client-1", Role::Unrecognized("authenticated".into())),
        Json(booking("pet-1", "09:00")),
    )
    .await;
    assert_matches!(stranger, Err(AppError::Forbidden(_)));

    // Slot is free, but the pet belongs to someone else.
    let not_owner = book_appointment(
        State(state),
        create_test_actor("client-1", Role::Client),
        Json(booking("pet-2", "09:00")),
    )
    .await;
    assert_matches!(not_owner, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_book_appointment_missing_pet_or_vet() {
    let state = seeded_state().await;

    let missing_pet = book_appointment(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Json(booking("pet-404", "09:00")),
    )
    .await;
    assert_matches!(missing_pet, Err(AppError::NotFound(msg)) if msg == "Pet not found");

    let mut request = booking("pet-1", "09:00");
    request.veterinarian_id = "vet-404".to_string();
    let missing_vet = book_appointment(
        State(state),
        create_test_actor("client-1", Role::Client),
        Json(request),
    )
    .await;
    assert_matches!(missing_vet, Err(AppError::NotFound(msg)) if msg == "Veterinarian not found");
}

#[tokio::test]
async fn test_book_appointment_requires_exact_slot_start() {
    let state = seeded_state().await;

    for time in ["09:15", "08:30", "12:00"] {
        let result = book_appointment(
            State(state.clone()),
            create_test_actor("client-1", Role::Client),
            Json(booking("pet-1", time)),
        )
        .await;
        assert_matches!(
            result,
            Err(AppError::Conflict(msg)) if msg == "Selected time is not available"
        );
    }
}

#[tokio::test]
async fn test_admin_books_on_behalf_of_owner() {
    let state = seeded_state().await;

    let (_, Json(body)) = book_appointment(
        State(state),
        create_test_actor("admin-1", Role::Admin),
        Json(booking("pet-2", "10:00")),
    )
    .await
    .unwrap();

    assert_eq!(body["data"]["client_id"], "client-2");
}

#[tokio::test]
async fn test_list_appointments_scoped_by_role() {
    let state = seeded_state().await;
    book_as_client_1(&state, "09:00").await;
    book_appointment(
        State(state.clone()),
        create_test_actor("client-2", Role::Client),
        Json(booking("pet-2", "09:30")),
    )
    .await
    .unwrap();

    let count = |body: serde_json::Value| body["data"].as_array().unwrap().len();

    let Json(body) = list_appointments(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Query(AppointmentListQuery {
            client_id: Some("client-2".to_string()),
            veterinarian_id: None,
        }),
    )
    .await
    .unwrap();
    assert_eq!(count(body), 1);

    let Json(body) = list_appointments(
        State(state.clone()),
        create_test_actor("vet-1", Role::Veterinarian),
        Query(AppointmentListQuery::default()),
    )
    .await
    .unwrap();
    assert_eq!(count(body), 2);

    let Json(body) = list_appointments(
        State(state.clone()),
        create_test_actor("admin-1", Role::Admin),
        Query(AppointmentListQuery {
            client_id: Some("client-2".to_string()),
            veterinarian_id: None,
        }),
    )
    .await
    .unwrap();
    assert_eq!(count(body), 1);

    let denied = list_appointments(
        State(state),
        create_test_actor("user-9", Role::Unrecognized("user".into())),
        Query(AppointmentListQuery::default()),
    )
    .await;
    assert_matches!(denied, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_get_appointment_permissions() {
    let state = seeded_state().await;
    let id = book_as_client_1(&state, "09:00").await;

    for actor in [
        create_test_actor("client-1", Role::Client),
        create_test_actor("vet-1", Role::Veterinarian),
        create_test_actor("admin-1", Role::Admin),
    ] {
        assert!(get_appointment(State(state.clone()), actor, Path(id.clone())).await.is_ok());
    }

    let other_client = get_appointment(
        State(state.clone()),
        create_test_actor("client-2", Role::Client),
        Path(id),
    )
    .await;
    assert_matches!(other_client, Err(AppError::Forbidden(_)));

    let missing = get_appointment(
        State(state),
        create_test_actor("admin-1", Role::Admin),
        Path("nope".to_string()),
    )
    .await;
    assert_matches!(missing, Err(AppError::NotFound(msg)) if msg == "Appointment not found");
}

#[tokio::test]
async fn test_update_appointment_fields_and_status() {
    let state = seeded_state().await;
    let id = book_as_client_1(&state, "09:00").await;

    let Json(body) = update_appointment(
        State(state.clone()),
        create_test_actor("vet-1", Role::Veterinarian),
        Path(id.clone()),
        Json(UpdateAppointmentRequest {
            status: Some("completed".to_string()),
            notes: Some("Healthy".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["notes"], "Healthy");
    assert_eq!(body["data"]["reason"], "Annual checkup");

    let invalid = update_appointment(
        State(state.clone()),
        create_test_actor("vet-1", Role::Veterinarian),
        Path(id.clone()),
        Json(UpdateAppointmentRequest {
            status: Some("no_show".to_string()),
            ..Default::default()
        }),
    )
    .await;
    assert_matches!(invalid, Err(AppError::ValidationError(msg)) if msg == "Invalid status");

    let reopen = update_appointment(
        State(state),
        create_test_actor("vet-1", Role::Veterinarian),
        Path(id),
        Json(UpdateAppointmentRequest {
            status: Some("scheduled".to_string()),
            ..Default::default()
        }),
    )
    .await;
    assert_matches!(reopen, Err(AppError::Conflict(_)));
}

#[tokio::test]
async fn test_update_appointment_reschedules_into_open_slot() {
    let state = seeded_state().await;
    let id = book_as_client_1(&state, "09:00").await;
    book_as_client_1(&state, "10:00").await;

    let taken = update_appointment(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Path(id.clone()),
        Json(UpdateAppointmentRequest {
            appointment_date: Some(at("10:00")),
            ..Default::default()
        }),
    )
    .await;
    assert_matches!(taken, Err(AppError::Conflict(_)));

    // Extending in place only competes with other appointments.
    let Json(body) = update_appointment(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Path(id.clone()),
        Json(UpdateAppointmentRequest {
            duration_minutes: Some(60),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(body["data"]["duration_minutes"], 60);

    let Json(body) = update_appointment(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Path(id.clone()),
        Json(UpdateAppointmentRequest {
            appointment_date: Some(at("11:00")),
            duration_minutes: Some(30),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(body["data"]["appointment_date"], at("11:00"));

    let bad_duration = update_appointment(
        State(state),
        create_test_actor("client-1", Role::Client),
        Path(id),
        Json(UpdateAppointmentRequest {
            duration_minutes: Some(0),
            ..Default::default()
        }),
    )
    .await;
    assert_matches!(bad_duration, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_cancel_is_soft_and_idempotent() {
    let state = seeded_state().await;
    let id = book_as_client_1(&state, "09:00").await;

    let Json(body) = cancel_appointment(
        State(state.clone()),
        create_test_actor("vet-1", Role::Veterinarian),
        Path(id.clone()),
    )
    .await
    .unwrap();
    assert_eq!(body["message"], "Appointment cancelled successfully");

    let stored = state.store.get_appointment(&id).await.unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);

    let again = cancel_appointment(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Path(id.clone()),
    )
    .await;
    assert!(again.is_ok());

    let Json(body) = get_appointment(
        State(state),
        create_test_actor("client-1", Role::Client),
        Path(id),
    )
    .await
    .unwrap();
    assert_eq!(body["data"]["status"], "cancelled");
}

#[tokio::test]
async fn test_cancel_completed_or_foreign_appointment_is_rejected() {
    let state = seeded_state().await;
    let id = book_as_client_1(&state, "09:00").await;

    let foreign = cancel_appointment(
        State(state.clone()),
        create_test_actor("client-2", Role::Client),
        Path(id.clone()),
    )
    .await;
    assert_matches!(foreign, Err(AppError::Forbidden(_)));

    update_appointment(
        State(state.clone()),
        create_test_actor("vet-1", Role::Veterinarian),
        Path(id.clone()),
        Json(UpdateAppointmentRequest {
            status: Some("completed".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    let completed = cancel_appointment(
        State(state),
        create_test_actor("client-1", Role::Client),
        Path(id),
    )
    .await;
    assert_matches!(completed, Err(AppError::Conflict(_)));
}
