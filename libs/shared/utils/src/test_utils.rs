use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::{AppConfig, StorageBackend};
use shared_database::{AppState, InMemoryStore};
use shared_models::auth::{Actor, Role, User};
use shared_models::clinic::{Client, Veterinarian, WorkingHours};
use shared_models::pet::Pet;

use crate::jwt::sign;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub storage_backend: StorageBackend,
    pub rate_limit_per_minute: u64,
    pub public_rate_limit_per_minute: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            storage_backend: StorageBackend::Memory,
            rate_limit_per_minute: 1000,
            public_rate_limit_per_minute: 1000,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            port: 0,
            environment: "test".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            storage_backend: self.storage_backend,
            request_timeout_secs: 5,
            shutdown_grace_secs: 1,
            rate_limit_per_minute: self.rate_limit_per_minute,
            public_rate_limit_per_minute: self.public_rate_limit_per_minute,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    /// Handler state backed by a fresh in-memory store.
    pub fn to_state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(
            self.to_app_config(),
            Arc::new(InMemoryStore::new()),
        ))
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "authenticated".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn client(email: &str) -> Self {
        Self::new(email, "client")
    }

    pub fn veterinarian(email: &str) -> Self {
        Self::new(email, "veterinarian")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn to_actor(&self) -> Actor {
        Actor::new(self.id.clone(), Some(self.email.clone()), Role::parse(&self.role))
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "aud": "authenticated",
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);
        let signature = sign(&signing_input, secret).expect("HMAC can take key of any size");
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Ready-made records for seeding a store in tests.
pub struct Fixtures;

impl Fixtures {
    pub fn client(id: &str) -> Client {
        Client {
            id: id.to_string(),
            name: "Alex Owner".to_string(),
            email: format!("{}@example.com", id),
            phone: "555-0100".to_string(),
            address: "1 Main St".to_string(),
            role: "client".to_string(),
        }
    }

    /// A veterinarian working 09:00-17:00 Monday to Friday.
    pub fn veterinarian(id: &str) -> Veterinarian {
        let available_hours = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
            .iter()
            .map(|day| WorkingHours::new(day, "09:00", "17:00"))
            .collect();

        Veterinarian {
            id: id.to_string(),
            name: "Dr. Sam Vet".to_string(),
            email: format!("{}@clinic.example.com", id),
            phone: "555-0199".to_string(),
            clinic_address: "2 Clinic Rd".to_string(),
            available_hours,
            role: "veterinarian".to_string(),
        }
    }

    pub fn pet(id: &str, owner_id: &str) -> Pet {
        let now = Utc::now();
        Pet {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: "Rex".to_string(),
            pet_type: "dog".to_string(),
            breed: "Labrador".to_string(),
            date_of_birth: None,
            weight: 28.5,
            created_at: now,
            updated_at: now,
        }
    }
}
