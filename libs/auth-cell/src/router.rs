use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;
use shared_utils::rate_limit::{protected_rate_limit, public_rate_limit};

use crate::handlers;
use crate::middleware::actor_middleware;

pub fn auth_routes(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/auth/validate", post(handlers::validate_token))
        .layer(middleware::from_fn_with_state(state.clone(), public_rate_limit));

    let protected_routes = Router::new()
        .route("/profile", get(handlers::get_profile))
        .route("/users", post(handlers::create_user).get(handlers::list_users))
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .layer(middleware::from_fn_with_state(state.clone(), actor_middleware))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), protected_rate_limit));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
