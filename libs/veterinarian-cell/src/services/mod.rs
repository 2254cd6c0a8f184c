pub mod availability;
pub mod veterinarian;
