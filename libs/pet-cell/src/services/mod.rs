pub mod medical_records;
pub mod pets;
pub mod qr_codes;
