use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::RepositoryError;
use shared_models::error::AppError;
use shared_models::shop::{Order, OrderItem, OrderStatus, ProductDimensions};

// ==============================================================================
// PRODUCTS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub dimensions: ProductDimensions,
    #[serde(default)]
    pub is_prescription_required: bool,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub stock_quantity: Option<i32>,
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub weight: Option<f64>,
    pub dimensions: Option<ProductDimensions>,
    pub is_prescription_required: Option<bool>,
    pub is_active: Option<bool>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStockRequest {
    pub stock_quantity: i32,
}

/// Lets an admin create a product in a veterinarian's catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductOwnerQuery {
    pub veterinarian_id: Option<String>,
}

// ==============================================================================
// ORDERS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub veterinarian_id: String,
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub delivery_method: String,
    #[serde(default)]
    pub notes: String,
}

/// Lets an admin place an order on behalf of a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderClientQuery {
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListQuery {
    pub client_id: Option<String>,
    pub veterinarian_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("Only veterinarians can create products")]
    ProductCreationNotAllowed,

    #[error("Missing or invalid required fields (name, category, price)")]
    MissingProductFields,

    #[error("Price must be greater than 0")]
    InvalidPrice,

    #[error("Stock quantity cannot be negative")]
    NegativeStock,

    #[error("Only clients can create orders")]
    OrderingNotAllowed,

    #[error("Missing required fields (veterinarian_id, items)")]
    MissingOrderFields,

    #[error("Item quantity must be greater than 0")]
    InvalidQuantity,

    #[error("Product not found: {0}")]
    UnknownProduct(String),

    #[error("Product is not available: {0}")]
    InactiveProduct(String),

    #[error("All products must be from the same veterinarian")]
    MixedVeterinarians,

    #[error("Insufficient stock for product: {0}")]
    InsufficientStock(String),

    #[error("Invalid order status")]
    InvalidOrderStatus,

    #[error("Invalid payment status")]
    InvalidPaymentStatus,

    #[error("Order cannot be cancelled in current status")]
    NotCancellable,

    #[error("Order status cannot change from {from} to {to}")]
    StatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order quantity is too large")]
    QuantityTooLarge,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ShopError> for AppError {
    fn from(err: ShopError) -> Self {
        match err {
            ShopError::ProductCreationNotAllowed | ShopError::OrderingNotAllowed => {
                AppError::Forbidden(err.to_string())
            }
            ShopError::UnknownProduct(_) => AppError::NotFound(err.to_string()),
            ShopError::Repository(e) => e.into(),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}
