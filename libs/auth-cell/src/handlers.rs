use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use shared_database::AppState;
use shared_models::auth::{Actor, TokenResponse};
use shared_models::error::AppError;
use shared_utils::jwt::validate_token as decode_token;

use crate::models::{CreateUserRequest, ListUsersQuery, UpdateUserRequest};
use crate::services::users::UserService;

#[axum::debug_handler]
pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let user = decode_token(auth.token(), &state.config.supabase_jwt_secret)
        .map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

#[axum::debug_handler]
pub async fn get_profile(Extension(actor): Extension<Actor>) -> Result<Json<Value>, AppError> {
    Ok(Json(json!({
        "success": true,
        "data": actor
    })))
}

// ==============================================================================
// USER PROFILES
// ==============================================================================

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = UserService::new(state.store.as_ref());
    let profile = service.create_profile(&actor, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": profile
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(state.store.as_ref());
    let profiles = service.list_profiles(&actor, &query).await?;

    Ok(Json(json!({
        "success": true,
        "data": profiles
    })))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(state.store.as_ref());
    let profile = service.get_profile(&actor, &user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": profile
    })))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(state.store.as_ref());
    let profile = service.update_profile(&actor, &user_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": profile
    })))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(state.store.as_ref());
    service.delete_profile(&actor, &user_id).await?;

    Ok(Json(json!({
        "message": "User deleted successfully"
    })))
}
