use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use auth_cell::actor_middleware;
use shared_database::AppState;
use shared_utils::extractor::auth_middleware;
use shared_utils::rate_limit::protected_rate_limit;

use crate::handlers;

pub fn veterinarian_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/veterinarians", get(handlers::list_veterinarians))
        .route(
            "/veterinarians/{id}/availability",
            get(handlers::get_available_slots).post(handlers::set_availability),
        )
        .layer(middleware::from_fn_with_state(state.clone(), actor_middleware))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), protected_rate_limit))
        .with_state(state)
}
