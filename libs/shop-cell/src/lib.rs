pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::ShopError;
pub use services::{orders::OrderService, products::ProductService};
