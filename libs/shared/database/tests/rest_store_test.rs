use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_database::supabase::SupabaseClient;
use shared_database::{
    AppointmentRepository, OrderRepository, PetRepository, ProfileRepository, QrCodeRepository,
    RepositoryError, SupabaseStore,
};
use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::shop::{Order, OrderStatus, PaymentStatus};

fn store_for(server: &MockServer) -> SupabaseStore {
    SupabaseStore::from_client(SupabaseClient::with_base_url(&server.uri(), "service-key"))
}

fn appointment_json(id: &str, date: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "client_id": "client-1",
        "veterinarian_id": "vet-1",
        "pet_id": "pet-1",
        "appointment_date": date,
        "duration_minutes": 30,
        "reason": "Vaccination",
        "status": status,
        "notes": null,
        "created_at": "2025-03-01T10:00:00Z",
        "updated_at": "2025-03-01T10:00:00Z"
    })
}

#[tokio::test]
async fn get_veterinarian_decodes_working_hours() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/veterinarians"))
        .and(query_param("id", "eq.vet-1"))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "vet-1",
            "name": "Dr. Rivera",
            "email": "rivera@clinic.test",
            "phone": "555-0100",
            "clinic_address": "1 Main St",
            "available_hours": [
                { "day_of_week": "Mon", "start": "09:00", "end": "12:00" }
            ],
            "role": "veterinarian"
        }])))
        .mount(&server)
        .await;

    let vet = store_for(&server).get_veterinarian("vet-1").await.unwrap();

    assert_eq!(vet.name, "Dr. Rivera");
    assert_eq!(vet.available_hours.len(), 1);
    assert_eq!(vet.available_hours[0].day_of_week, "Mon");
}

#[tokio::test]
async fn empty_result_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/pets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = store_for(&server).get_pet("missing").await;

    assert_matches!(result, Err(RepositoryError::NotFound(entity)) if entity == "Pet");
}

#[tokio::test]
async fn day_range_query_uses_half_open_bounds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("veterinarian_id", "eq.vet-1"))
        .and(query_param("appointment_date", "gte.2025-03-03T00:00:00Z"))
        .and(query_param("appointment_date", "lt.2025-03-04T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_json("a1", "2025-03-03T09:30:00Z", "scheduled")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let from = Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap();
    let appointments = store_for(&server)
        .list_veterinarian_appointments_between("vet-1", from, to)
        .await
        .unwrap();

    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn unique_violation_on_insert_is_a_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"appointments_vet_start_active_idx\""
        })))
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
    let appointment = Appointment {
        id: "a2".into(),
        client_id: "client-1".into(),
        veterinarian_id: "vet-1".into(),
        pet_id: "pet-1".into(),
        appointment_date: start,
        duration_minutes: 30,
        reason: "Vaccination".into(),
        status: AppointmentStatus::Scheduled,
        notes: None,
        created_at: start,
        updated_at: start,
    };

    let result = store_for(&server).create_appointment(&appointment).await;

    assert_matches!(result, Err(RepositoryError::Conflict(msg)) if msg == "Selected time is not available");
}

#[tokio::test]
async fn order_rpc_exception_is_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/create_order_with_items"))
        .and(body_partial_json(json!({ "p_order": { "id": "order-1" } })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "P0001",
            "message": "Insufficient stock for product: Kibble"
        })))
        .mount(&server)
        .await;

    let now = Utc::now();
    let order = Order {
        id: "order-1".into(),
        client_id: "client-1".into(),
        veterinarian_id: "vet-1".into(),
        total_amount: 20.0,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_method: String::new(),
        shipping_address: String::new(),
        delivery_method: String::new(),
        notes: String::new(),
        created_at: now,
        updated_at: now,
    };

    let result = store_for(&server).create_order(&order, &[]).await;

    assert_matches!(result, Err(RepositoryError::Rejected(msg)) if msg == "Insufficient stock for product: Kibble");
}

#[tokio::test]
async fn delete_profile_falls_back_to_veterinarians() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/clients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/veterinarians"))
        .and(query_param("id", "eq.vet-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "vet-1" }])))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server).delete_profile("vet-1").await.unwrap();
}

#[tokio::test]
async fn status_patch_only_applies_to_the_expected_status() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/orders"))
        .and(query_param("id", "eq.order-1"))
        .and(query_param("status", "eq.pending"))
        .and(body_partial_json(json!({ "status": "confirmed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let result = store_for(&server)
        .update_order_status("order-1", OrderStatus::Pending, Some(OrderStatus::Confirmed), None)
        .await;

    assert_matches!(result, Err(RepositoryError::Conflict(_)));
}

#[tokio::test]
async fn public_qr_lookup_only_matches_active_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/qr_codes"))
        .and(query_param("public_url", "eq./public/pets/abc"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let result = store_for(&server)
        .get_active_qr_code_by_public_url("/public/pets/abc")
        .await;

    assert_matches!(result, Err(RepositoryError::NotFound(entity)) if entity == "QR code");
}
