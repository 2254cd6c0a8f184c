use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::Actor;
use shared_models::error::AppError;
use shared_models::shop::ProductFilters;

use crate::models::{
    CreateOrderRequest, CreateProductRequest, OrderClientQuery, OrderListQuery, ProductOwnerQuery,
    UpdateOrderStatusRequest, UpdateProductRequest, UpdateStockRequest,
};
use crate::services::{orders::OrderService, products::ProductService};

// ==============================================================================
// PRODUCTS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(owner): Query<ProductOwnerQuery>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ProductService::new(state.store.as_ref());
    let product = service
        .create_product(&actor, owner.veterinarian_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": product
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Extension(_actor): Extension<Actor>,
    Query(filters): Query<ProductFilters>,
) -> Result<Json<Value>, AppError> {
    let service = ProductService::new(state.store.as_ref());
    let products = service.list_products(&filters).await?;

    Ok(Json(json!({
        "success": true,
        "data": products
    })))
}

#[axum::debug_handler]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Extension(_actor): Extension<Actor>,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ProductService::new(state.store.as_ref());
    let product = service.get_product(&product_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": product
    })))
}

#[axum::debug_handler]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(product_id): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProductService::new(state.store.as_ref());
    let product = service.update_product(&actor, &product_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": product
    })))
}

#[axum::debug_handler]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(product_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ProductService::new(state.store.as_ref());
    service.deactivate_product(&actor, &product_id).await?;

    Ok(Json(json!({ "message": "Product deactivated successfully" })))
}

#[axum::debug_handler]
pub async fn update_stock(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(product_id): Path<String>,
    Json(request): Json<UpdateStockRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProductService::new(state.store.as_ref());
    service
        .update_stock(&actor, &product_id, request.stock_quantity)
        .await?;

    Ok(Json(json!({ "message": "Stock updated successfully" })))
}

#[axum::debug_handler]
pub async fn list_veterinarian_products(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(veterinarian_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ProductService::new(state.store.as_ref());
    let products = service
        .list_veterinarian_products(&actor, &veterinarian_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": products
    })))
}

// ==============================================================================
// ORDERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(client): Query<OrderClientQuery>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = OrderService::new(state.store.as_ref());
    let details = service.create_order(&actor, client.client_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": details
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = OrderService::new(state.store.as_ref());
    let orders = service.list_orders(&actor, &query).await?;

    Ok(Json(json!({
        "success": true,
        "data": orders
    })))
}

#[axum::debug_handler]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = OrderService::new(state.store.as_ref());
    let details = service.get_order(&actor, &order_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": details
    })))
}

#[axum::debug_handler]
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(order_id): Path<String>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = OrderService::new(state.store.as_ref());
    service.update_status(&actor, &order_id, request).await?;

    Ok(Json(json!({ "message": "Order status updated successfully" })))
}

#[axum::debug_handler]
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = OrderService::new(state.store.as_ref());
    service.cancel_order(&actor, &order_id).await?;

    Ok(Json(json!({ "message": "Order cancelled successfully" })))
}
