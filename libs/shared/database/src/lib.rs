pub mod locks;
pub mod memory;
pub mod rate_limit;
pub mod repository;
pub mod rest_store;
pub mod state;
pub mod supabase;

pub use memory::InMemoryStore;
pub use repository::{
    AppointmentQuery, AppointmentRepository, MedicalRecordRepository, OrderQuery,
    OrderRepository, PetRepository, ProductRepository, ProfileRepository, QrCodeRepository,
    RepoResult, RepositoryError, Store,
};
pub use rest_store::SupabaseStore;
pub use state::AppState;
