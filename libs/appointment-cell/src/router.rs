use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use auth_cell::actor_middleware;
use shared_database::AppState;
use shared_utils::extractor::auth_middleware;
use shared_utils::rate_limit::protected_rate_limit;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/appointments",
            post(handlers::book_appointment).get(handlers::list_appointments),
        )
        .route(
            "/appointments/{id}",
            get(handlers::get_appointment)
                .put(handlers::update_appointment)
                .delete(handlers::cancel_appointment),
        )
        .layer(middleware::from_fn_with_state(state.clone(), actor_middleware))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), protected_rate_limit))
        .with_state(state)
}
