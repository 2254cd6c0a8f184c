use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use auth_cell::actor_middleware;
use shared_database::AppState;
use shared_utils::extractor::auth_middleware;
use shared_utils::rate_limit::protected_rate_limit;

use crate::handlers;

pub fn shop_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/products",
            post(handlers::create_product).get(handlers::list_products),
        )
        .route(
            "/products/{id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/products/{id}/stock", put(handlers::update_stock))
        .route(
            "/veterinarians/{id}/products",
            get(handlers::list_veterinarian_products),
        )
        .route(
            "/orders",
            post(handlers::create_order).get(handlers::list_orders),
        )
        .route(
            "/orders/{id}",
            get(handlers::get_order).delete(handlers::cancel_order),
        )
        .route("/orders/{id}/status", put(handlers::update_order_status))
        .layer(middleware::from_fn_with_state(state.clone(), actor_middleware))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), protected_rate_limit))
        .with_state(state)
}
