use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use shared_models::appointment::Appointment;
use shared_models::clinic::{Client, Veterinarian};
use shared_models::error::AppError;
use shared_models::pet::{MedicalRecord, Pet, PetQrCode};
use shared_models::shop::{Order, OrderItem, OrderStatus, PaymentStatus, Product, ProductFilters};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness rule in storage refused the write.
    #[error("{0}")]
    Conflict(String),

    /// Storage refused the write because of the current row state (stock, status).
    #[error("{0}")]
    Rejected(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            RepositoryError::Conflict(msg) => AppError::Conflict(msg),
            RepositoryError::Rejected(msg) => AppError::BadRequest(msg),
            RepositoryError::Backend(msg) => AppError::Database(msg),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentQuery {
    pub client_id: Option<String>,
    pub veterinarian_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub client_id: Option<String>,
    pub veterinarian_id: Option<String>,
}

// ==============================================================================
// CAPABILITIES
// ==============================================================================

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_client(&self, id: &str) -> RepoResult<Client>;
    async fn get_veterinarian(&self, id: &str) -> RepoResult<Veterinarian>;
    async fn list_clients(&self) -> RepoResult<Vec<Client>>;
    async fn list_veterinarians(&self) -> RepoResult<Vec<Veterinarian>>;
    async fn create_client(&self, client: &Client) -> RepoResult<Client>;
    async fn create_veterinarian(&self, vet: &Veterinarian) -> RepoResult<Veterinarian>;
    async fn update_client(&self, client: &Client) -> RepoResult<Client>;
    async fn update_veterinarian(&self, vet: &Veterinarian) -> RepoResult<Veterinarian>;
    /// Removes the client or veterinarian profile with this id.
    async fn delete_profile(&self, id: &str) -> RepoResult<()>;
}

#[async_trait]
pub trait PetRepository: Send + Sync {
    async fn get_pet(&self, id: &str) -> RepoResult<Pet>;
    async fn list_pets_by_owner(&self, owner_id: &str) -> RepoResult<Vec<Pet>>;
    async fn create_pet(&self, pet: &Pet) -> RepoResult<Pet>;
    async fn update_pet(&self, pet: &Pet) -> RepoResult<Pet>;
    async fn delete_pet(&self, id: &str) -> RepoResult<()>;
}

#[async_trait]
pub trait MedicalRecordRepository: Send + Sync {
    async fn get_medical_record(&self, id: &str) -> RepoResult<MedicalRecord>;
    async fn list_medical_records(&self, pet_id: &str) -> RepoResult<Vec<MedicalRecord>>;
    async fn create_medical_record(&self, record: &MedicalRecord) -> RepoResult<MedicalRecord>;
    async fn update_medical_record(&self, record: &MedicalRecord) -> RepoResult<MedicalRecord>;
    async fn delete_medical_record(&self, id: &str) -> RepoResult<()>;
}

#[async_trait]
pub trait QrCodeRepository: Send + Sync {
    async fn get_qr_code_by_pet(&self, pet_id: &str) -> RepoResult<PetQrCode>;
    /// Only active tags resolve; inactive ones read as `NotFound`.
    async fn get_active_qr_code_by_public_url(&self, public_url: &str) -> RepoResult<PetQrCode>;
    /// Fails with `Conflict` when the pet already has a tag.
    async fn create_qr_code(&self, qr_code: &PetQrCode) -> RepoResult<PetQrCode>;
    async fn update_qr_code(&self, qr_code: &PetQrCode) -> RepoResult<PetQrCode>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn get_appointment(&self, id: &str) -> RepoResult<Appointment>;
    async fn list_appointments(&self, query: &AppointmentQuery) -> RepoResult<Vec<Appointment>>;
    /// Every appointment of the veterinarian starting in `[from, to)`, any status.
    async fn list_veterinarian_appointments_between(
        &self,
        veterinarian_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> RepoResult<Vec<Appointment>>;
    /// Fails with `Conflict` when another non-cancelled appointment of the same
    /// veterinarian starts at the same instant.
    async fn create_appointment(&self, appointment: &Appointment) -> RepoResult<Appointment>;
    async fn update_appointment(&self, appointment: &Appointment) -> RepoResult<Appointment>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get_product(&self, id: &str) -> RepoResult<Product>;
    async fn list_products(&self, filters: &ProductFilters) -> RepoResult<Vec<Product>>;
    async fn create_product(&self, product: &Product) -> RepoResult<Product>;
    async fn update_product(&self, product: &Product) -> RepoResult<Product>;
    async fn set_product_stock(&self, id: &str, stock_quantity: i32) -> RepoResult<Product>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn get_order(&self, id: &str) -> RepoResult<Order>;
    async fn list_orders(&self, query: &OrderQuery) -> RepoResult<Vec<Order>>;
    async fn list_order_items(&self, order_id: &str) -> RepoResult<Vec<OrderItem>>;
    /// Persists the order and its items and decrements stock as one unit.
    /// Fails with `Rejected` when any product lacks stock.
    async fn create_order(&self, order: &Order, items: &[OrderItem]) -> RepoResult<Order>;
    /// Writes only while the stored status still equals `expected`; a moved
    /// order fails with `Conflict`.
    async fn update_order_status(
        &self,
        id: &str,
        expected: OrderStatus,
        status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
    ) -> RepoResult<Order>;
    /// Marks the order cancelled and restores item stock as one unit.
    /// Fails with `Rejected` when the order is no longer cancellable.
    async fn cancel_order(&self, id: &str) -> RepoResult<Order>;
}

/// Every capability the API needs from one storage technology.
#[async_trait]
pub trait Store:
    ProfileRepository
    + PetRepository
    + MedicalRecordRepository
    + QrCodeRepository
    + AppointmentRepository
    + ProductRepository
    + OrderRepository
{
    async fn ping(&self) -> RepoResult<()>;
}
