use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use auth_cell::actor_middleware;
use shared_database::AppState;
use shared_utils::extractor::auth_middleware;
use shared_utils::rate_limit::{protected_rate_limit, public_rate_limit};

use crate::handlers;

pub fn pet_routes(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/public/pets/{id}", get(handlers::get_public_pet_profile))
        .layer(middleware::from_fn_with_state(state.clone(), public_rate_limit));

    let protected_routes = Router::new()
        .route("/pets", post(handlers::create_pet))
        .route(
            "/pets/{id}",
            get(handlers::get_pet)
                .put(handlers::update_pet)
                .delete(handlers::delete_pet),
        )
        .route(
            "/pets/{id}/qr-code",
            post(handlers::generate_qr_code)
                .get(handlers::get_qr_code)
                .put(handlers::update_qr_code)
                .delete(handlers::delete_qr_code),
        )
        .route("/clients/{id}/pets", get(handlers::list_client_pets))
        .route(
            "/pets/{id}/medical-records",
            post(handlers::create_medical_record).get(handlers::list_medical_records),
        )
        .route(
            "/medical-records/{id}",
            get(handlers::get_medical_record)
                .put(handlers::update_medical_record)
                .delete(handlers::delete_medical_record),
        )
        .layer(middleware::from_fn_with_state(state.clone(), actor_middleware))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), protected_rate_limit));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
