pub mod appointment;
pub mod auth;
pub mod clinic;
pub mod error;
pub mod pet;
pub mod shop;
