use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::Actor;
use shared_models::error::AppError;

use crate::models::{
    CreateMedicalRecordRequest, CreatePetRequest, UpdateMedicalRecordRequest, UpdatePetRequest,
    UpdateQrCodeRequest,
};
use crate::services::medical_records::MedicalRecordService;
use crate::services::pets::PetService;
use crate::services::qr_codes::{PayloadOnlyEncoder, QrCodeService};

// ==============================================================================
// PETS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_pet(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreatePetRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = PetService::new(state.store.as_ref());
    let pet = service.create_pet(&actor, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": pet
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_pet(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(pet_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PetService::new(state.store.as_ref());
    let pet = service.get_pet(&actor, &pet_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": pet
    })))
}

#[axum::debug_handler]
pub async fn update_pet(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(pet_id): Path<String>,
    Json(request): Json<UpdatePetRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PetService::new(state.store.as_ref());
    let pet = service.update_pet(&actor, &pet_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": pet
    })))
}

#[axum::debug_handler]
pub async fn delete_pet(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(pet_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PetService::new(state.store.as_ref());
    service.delete_pet(&actor, &pet_id).await?;

    Ok(Json(json!({ "message": "Pet deleted successfully" })))
}

#[axum::debug_handler]
pub async fn list_client_pets(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(client_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PetService::new(state.store.as_ref());
    let pets = service.list_client_pets(&actor, &client_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": pets
    })))
}

// ==============================================================================
// MEDICAL RECORDS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_medical_record(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(pet_id): Path<String>,
    Json(request): Json<CreateMedicalRecordRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = MedicalRecordService::new(state.store.as_ref());
    let record = service.create_record(&actor, &pet_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": record
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_medical_records(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(pet_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(state.store.as_ref());
    let records = service.list_records(&actor, &pet_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": records
    })))
}

#[axum::debug_handler]
pub async fn get_medical_record(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(record_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(state.store.as_ref());
    let record = service.get_record(&actor, &record_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": record
    })))
}

#[axum::debug_handler]
pub async fn update_medical_record(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(record_id): Path<String>,
    Json(request): Json<UpdateMedicalRecordRequest>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(state.store.as_ref());
    let record = service.update_record(&actor, &record_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": record
    })))
}

#[axum::debug_handler]
pub async fn delete_medical_record(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(record_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = MedicalRecordService::new(state.store.as_ref());
    service.delete_record(&actor, &record_id).await?;

    Ok(Json(json!({ "message": "Medical record deleted successfully" })))
}

// ==============================================================================
// QR CODES
// ==============================================================================

#[axum::debug_handler]
pub async fn generate_qr_code(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(pet_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = QrCodeService::new(state.store.as_ref(), &PayloadOnlyEncoder);
    let (qr_code, created) = service
        .generate(&actor, &pet_id, &state.config.frontend_url)
        .await?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(json!({
            "success": true,
            "data": qr_code
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_qr_code(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(pet_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = QrCodeService::new(state.store.as_ref(), &PayloadOnlyEncoder);
    let qr_code = service.get(&actor, &pet_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": qr_code
    })))
}

#[axum::debug_handler]
pub async fn update_qr_code(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(pet_id): Path<String>,
    Json(request): Json<UpdateQrCodeRequest>,
) -> Result<Json<Value>, AppError> {
    let service = QrCodeService::new(state.store.as_ref(), &PayloadOnlyEncoder);
    let qr_code = service.update(&actor, &pet_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": qr_code
    })))
}

#[axum::debug_handler]
pub async fn delete_qr_code(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(pet_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = QrCodeService::new(state.store.as_ref(), &PayloadOnlyEncoder);
    service.deactivate(&actor, &pet_id).await?;

    Ok(Json(json!({ "message": "QR code deactivated successfully" })))
}

/// No token: anyone holding the tag may read the profile.
#[axum::debug_handler]
pub async fn get_public_pet_profile(
    State(state): State<Arc<AppState>>,
    Path(public_url): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = QrCodeService::new(state.store.as_ref(), &PayloadOnlyEncoder);
    let profile = service.public_profile(&public_url).await?;

    Ok(Json(json!({
        "success": true,
        "data": profile
    })))
}
