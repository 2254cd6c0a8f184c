use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use pet_cell::router::pet_routes;
use shared_database::AppState;
use shop_cell::router::shop_routes;
use veterinarian_cell::router::veterinarian_routes;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(auth_routes(state.clone()))
        .merge(veterinarian_routes(state.clone()))
        .merge(appointment_routes(state.clone()))
        .merge(pet_routes(state.clone()))
        .merge(shop_routes(state));

    Router::new()
        .route("/", get(|| async { "Pet Clinic API is running!" }))
        .route("/ping", get(|| async { "." }))
        .nest("/api/v1", api)
}
