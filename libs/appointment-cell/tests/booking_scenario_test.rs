mod common;

use assert_matches::assert_matches;
use axum::extract::{Json, State};
use futures::future::join_all;

use appointment_cell::handlers::book_appointment;
use appointment_cell::models::UpdateAppointmentRequest;
use appointment_cell::AppointmentBookingService;
use shared_database::{AppointmentQuery, AppointmentRepository};
use shared_models::appointment::AppointmentStatus;
use shared_models::auth::{Actor, Role};
use shared_models::error::AppError;

use common::{booking, create_test_actor, seeded_state};

#[tokio::test]
async fn monday_morning_booking_flow() {
    let state = seeded_state().await;

    let (_, Json(first)) = book_appointment(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Json(booking("pet-1", "09:00")),
    )
    .await
    .unwrap();
    assert_eq!(first["data"]["status"], "scheduled");

    let second = book_appointment(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Json(booking("pet-1", "09:00")),
    )
    .await;
    assert_matches!(second, Err(AppError::Conflict(_)));

    let (_, Json(third)) = book_appointment(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Json(booking("pet-1", "09:30")),
    )
    .await
    .unwrap();
    assert_eq!(third["data"]["status"], "scheduled");
}

#[tokio::test]
async fn concurrent_requests_for_one_slot_book_it_once() {
    let state = seeded_state().await;
    let actor = Actor::new("client-1", None, Role::Client);

    let attempts = (0..8).map(|_| {
        let state = state.clone();
        let actor = actor.clone();
        async move {
            AppointmentBookingService::new(&state)
                .book_appointment(&actor, booking("pet-1", "11:30"))
                .await
        }
    });
    let results = join_all(attempts).await;

    let booked = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(booked, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppError::Conflict(_))));

    let stored = state
        .store
        .list_appointments(&AppointmentQuery {
            client_id: None,
            veterinarian_id: Some("vet-1".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn cancelled_slot_can_be_booked_again() {
    let state = seeded_state().await;
    let actor = Actor::new("client-1", None, Role::Client);
    let service = AppointmentBookingService::new(&state);

    let first = service
        .book_appointment(&actor, booking("pet-1", "10:30"))
        .await
        .unwrap();
    service.cancel_appointment(&actor, &first.id).await.unwrap();

    let rebooked = service
        .book_appointment(&actor, booking("pet-1", "10:30"))
        .await
        .unwrap();
    assert_ne!(rebooked.id, first.id);

    // The cancelled record is still there.
    assert!(state.store.get_appointment(&first.id).await.is_ok());
}

#[tokio::test]
async fn concurrent_edits_never_undo_a_cancel() {
    let state = seeded_state().await;
    let actor = Actor::new("client-1", None, Role::Client);
    let booked = AppointmentBookingService::new(&state)
        .book_appointment(&actor, booking("pet-1", "09:30"))
        .await
        .unwrap();

    let edits = (0..6).map(|i| {
        let state = state.clone();
        let actor = actor.clone();
        let id = booked.id.clone();
        async move {
            let service = AppointmentBookingService::new(&state);
            if i == 3 {
                service.cancel_appointment(&actor, &id).await.map(|_| ())
            } else {
                let request = UpdateAppointmentRequest {
                    notes: Some(format!("edit {}", i)),
                    ..Default::default()
                };
                service.update_appointment(&actor, &id, request).await.map(|_| ())
            }
        }
    });
    let results = join_all(edits).await;
    assert!(results.iter().all(|r| r.is_ok()));

    let stored = state.store.get_appointment(&booked.id).await.unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);
}
