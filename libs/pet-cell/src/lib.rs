pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::PetError;
pub use services::{
    medical_records::MedicalRecordService, pets::PetService, qr_codes::QrCodeService,
};
