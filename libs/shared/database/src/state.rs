use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StorageBackend};

use crate::locks::KeyedLocks;
use crate::memory::InMemoryStore;
use crate::rate_limit::RateLimiter;
use crate::repository::Store;
use crate::rest_store::SupabaseStore;

/// Shared handler state: configuration, the storage capability, the
/// booking locks and the per-IP request budgets.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub booking_locks: KeyedLocks,
    pub protected_limiter: RateLimiter,
    pub public_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        Self {
            protected_limiter: RateLimiter::per_minute(config.rate_limit_per_minute),
            public_limiter: RateLimiter::per_minute(config.public_rate_limit_per_minute),
            config: Arc::new(config),
            store,
            booking_locks: KeyedLocks::new(),
        }
    }

    /// Wires the storage adapter named by the configuration.
    pub fn from_config(config: AppConfig) -> Self {
        let store: Arc<dyn Store> = match config.storage_backend {
            StorageBackend::Supabase => Arc::new(SupabaseStore::new(&config)),
            StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        };
        info!("Using {} storage backend", config.storage_backend);
        Self::new(config, store)
    }
}
