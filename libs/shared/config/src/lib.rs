use std::env;
use std::fmt;
use tracing::warn;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;
const DEFAULT_RATE_LIMIT_PER_MINUTE: u64 = 100;
const DEFAULT_PUBLIC_RATE_LIMIT_PER_MINUTE: u64 = 60;

/// Which persistence adapter the API is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Supabase,
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Supabase => write!(f, "supabase"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub environment: String,
    pub frontend_url: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub supabase_jwt_secret: String,
    pub storage_backend: StorageBackend,
    pub request_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
    /// Requests per client IP and minute on authenticated routes.
    pub rate_limit_per_minute: u64,
    /// Requests per client IP and minute on routes that need no token.
    pub public_rate_limit_per_minute: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Missing or
    /// unparseable values fall back to defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            port: value("PORT")
                .and_then(|raw| {
                    raw.parse::<u16>()
                        .map_err(|_| warn!("PORT value '{}' is not a valid port", raw))
                        .ok()
                })
                .unwrap_or_else(|| {
                    warn!("PORT not usable, using default {}", DEFAULT_PORT);
                    DEFAULT_PORT
                }),
            environment: value("ENV").unwrap_or_else(|| {
                warn!("ENV not set, using development");
                "development".to_string()
            }),
            frontend_url: value("FRONTEND_URL").unwrap_or_else(|| {
                warn!("FRONTEND_URL not set, only localhost origins are allowed");
                String::new()
            }),
            supabase_url: value("SUPABASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: value("SUPABASE_SERVICE_KEY").unwrap_or_else(|| {
                warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                String::new()
            }),
            supabase_jwt_secret: value("SUPABASE_JWT_SECRET").unwrap_or_else(|| {
                warn!("SUPABASE_JWT_SECRET not set, using empty value");
                String::new()
            }),
            storage_backend: match value("STORAGE_BACKEND").as_deref() {
                None | Some("supabase") => StorageBackend::Supabase,
                Some("memory") => StorageBackend::Memory,
                Some(other) => {
                    warn!("Unknown STORAGE_BACKEND '{}', using supabase", other);
                    StorageBackend::Supabase
                }
            },
            request_timeout_secs: parse_positive(
                value("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            shutdown_grace_secs: parse_positive(
                value("SHUTDOWN_GRACE_SECS"),
                "SHUTDOWN_GRACE_SECS",
                DEFAULT_SHUTDOWN_GRACE_SECS,
            ),
            rate_limit_per_minute: parse_positive(
                value("RATE_LIMIT_PER_MINUTE"),
                "RATE_LIMIT_PER_MINUTE",
                DEFAULT_RATE_LIMIT_PER_MINUTE,
            ),
            public_rate_limit_per_minute: parse_positive(
                value("PUBLIC_RATE_LIMIT_PER_MINUTE"),
                "PUBLIC_RATE_LIMIT_PER_MINUTE",
                DEFAULT_PUBLIC_RATE_LIMIT_PER_MINUTE,
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        self.missing_variables().is_empty()
    }

    /// Names of the required variables that are still empty for the selected backend.
    pub fn missing_variables(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if self.supabase_jwt_secret.is_empty() {
            missing.push("SUPABASE_JWT_SECRET");
        }
        if self.storage_backend == StorageBackend::Supabase {
            if self.supabase_url.is_empty() {
                missing.push("SUPABASE_URL");
            }
            if self.supabase_service_key.is_empty() {
                missing.push("SUPABASE_SERVICE_KEY");
            }
        }

        missing
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_positive(raw: Option<String>, key: &str, default: u64) -> u64 {
    match raw {
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                warn!("{} value '{}' is invalid, using {}", key, raw, default);
                default
            }
        },
        None => default,
    }
}
