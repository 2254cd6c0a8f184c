pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::AvailabilityError;
pub use services::availability::{compute_slots, normalize_day, AvailabilityService};
