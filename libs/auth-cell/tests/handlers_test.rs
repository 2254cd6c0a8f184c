use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::Authorization;

use auth_cell::handlers::{
    create_user, delete_user, get_profile, get_user, list_users, update_user, validate_token,
};
use auth_cell::models::{CreateUserRequest, ListUsersQuery, UpdateUserRequest};
use shared_database::{AppState, ProfileRepository};
use shared_models::auth::{Actor, Role};
use shared_models::error::AppError;
use shared_utils::test_utils::{Fixtures, JwtTestUtils, TestConfig, TestUser};

fn create_test_state() -> Arc<AppState> {
    TestConfig::default().to_state()
}

fn create_test_actor(id: &str, role: Role) -> Extension<Actor> {
    Extension(Actor::new(id, Some(format!("{}@example.com", id)), role))
}

fn create_request(role: &str) -> CreateUserRequest {
    CreateUserRequest {
        id: None,
        name: "Jamie".to_string(),
        email: "jamie@example.com".to_string(),
        phone: "555-0101".to_string(),
        address: "3 Elm St".to_string(),
        role: role.to_string(),
    }
}

#[tokio::test]
async fn test_validate_token_success() {
    let state = create_test_state();
    let user = TestUser::client("owner@example.com");
    let token = JwtTestUtils::create_test_token(&user, &state.config.supabase_jwt_secret, Some(1));

    let header = TypedHeader(Authorization::bearer(&token).unwrap());
    let response = validate_token(State(state), header).await.unwrap().0;

    assert!(response.valid);
    assert_eq!(response.user_id, user.id);
    assert_eq!(response.email, Some(user.email));
    assert_eq!(response.role.as_deref(), Some("client"));
}

#[tokio::test]
async fn test_validate_token_expired() {
    let state = create_test_state();
    let token = JwtTestUtils::create_expired_token(&TestUser::default(), &state.config.supabase_jwt_secret);

    let header = TypedHeader(Authorization::bearer(&token).unwrap());
    let result = validate_token(State(state), header).await;

    assert_matches!(result, Err(AppError::Auth(msg)) if msg == "Token expired");
}

#[tokio::test]
async fn test_get_profile_returns_resolved_actor() {
    let Json(body) = get_profile(create_test_actor("vet-1", Role::Veterinarian))
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], "vet-1");
    assert_eq!(body["data"]["role"], "veterinarian");
}

#[tokio::test]
async fn test_client_creates_own_profile() {
    let state = create_test_state();

    let (status, Json(body)) = create_user(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Json(create_request("client")),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], "client-1");
    assert_eq!(body["data"]["address"], "3 Elm St");
    assert!(state.store.get_client("client-1").await.is_ok());
}

#[tokio::test]
async fn test_non_admin_cannot_claim_another_role() {
    let state = create_test_state();

    let result = create_user(
        State(state),
        create_test_actor("client-1", Role::Client),
        Json(create_request("veterinarian")),
    )
    .await;

    assert_matches!(result, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_admin_creates_veterinarian_with_explicit_id() {
    let state = create_test_state();
    let mut request = create_request("veterinarian");
    request.id = Some("vet-7".to_string());

    let (_, Json(body)) = create_user(
        State(state.clone()),
        create_test_actor("admin-1", Role::Admin),
        Json(request),
    )
    .await
    .unwrap();

    assert_eq!(body["data"]["id"], "vet-7");
    assert_eq!(body["data"]["clinic_address"], "3 Elm St");
    assert!(state.store.get_veterinarian("vet-7").await.is_ok());
}

#[tokio::test]
async fn test_admin_cannot_create_admin_profiles() {
    let state = create_test_state();

    let result = create_user(
        State(state),
        create_test_actor("admin-1", Role::Admin),
        Json(create_request("admin")),
    )
    .await;

    assert_matches!(result, Err(AppError::BadRequest(msg)) if msg == "Invalid role");
}

#[tokio::test]
async fn test_list_users_is_admin_only_and_paginated() {
    let state = create_test_state();
    state.store.create_client(&Fixtures::client("client-1")).await.unwrap();
    state.store.create_client(&Fixtures::client("client-2")).await.unwrap();
    state.store.create_veterinarian(&Fixtures::veterinarian("vet-1")).await.unwrap();

    let denied = list_users(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Query(ListUsersQuery::default()),
    )
    .await;
    assert_matches!(denied, Err(AppError::Forbidden(_)));

    let Json(body) = list_users(
        State(state),
        create_test_actor("admin-1", Role::Admin),
        Query(ListUsersQuery { limit: Some(2), offset: Some(1) }),
    )
    .await
    .unwrap();

    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["client-2", "vet-1"]);
}

#[tokio::test]
async fn test_get_user_self_or_admin() {
    let state = create_test_state();
    state.store.create_veterinarian(&Fixtures::veterinarian("vet-1")).await.unwrap();

    let Json(body) = get_user(
        State(state.clone()),
        create_test_actor("vet-1", Role::Veterinarian),
        Path("vet-1".to_string()),
    )
    .await
    .unwrap();
    assert_eq!(body["data"]["id"], "vet-1");

    let other = get_user(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Path("vet-1".to_string()),
    )
    .await;
    assert_matches!(other, Err(AppError::Forbidden(_)));

    let missing = get_user(
        State(state),
        create_test_actor("admin-1", Role::Admin),
        Path("nobody".to_string()),
    )
    .await;
    assert_matches!(missing, Err(AppError::NotFound(msg)) if msg == "User not found");
}

#[tokio::test]
async fn test_update_user_changes_only_supplied_fields() {
    let state = create_test_state();
    state.store.create_client(&Fixtures::client("client-1")).await.unwrap();

    let request = UpdateUserRequest {
        phone: Some("555-0199".to_string()),
        ..Default::default()
    };
    let Json(body) = update_user(
        State(state),
        create_test_actor("client-1", Role::Client),
        Path("client-1".to_string()),
        Json(request),
    )
    .await
    .unwrap();

    assert_eq!(body["data"]["phone"], "555-0199");
    assert_eq!(body["data"]["name"], "Alex Owner");
}

#[tokio::test]
async fn test_delete_user_requires_admin() {
    let state = create_test_state();
    state.store.create_client(&Fixtures::client("client-1")).await.unwrap();

    let denied = delete_user(
        State(state.clone()),
        create_test_actor("client-1", Role::Client),
        Path("client-1".to_string()),
    )
    .await;
    assert_matches!(denied, Err(AppError::Forbidden(_)));

    let Json(body) = delete_user(
        State(state.clone()),
        create_test_actor("admin-1", Role::Admin),
        Path("client-1".to_string()),
    )
    .await
    .unwrap();
    assert_eq!(body["message"], "User deleted successfully");
    assert!(state.store.get_client("client-1").await.is_err());
}
