use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use shared_database::rate_limit::RateLimiter;
use shared_database::AppState;
use shared_models::error::AppError;

/// Per-IP budget for routes behind `auth_middleware`.
pub async fn protected_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state.protected_limiter, &request)?;
    Ok(next.run(request).await)
}

/// Per-IP budget for routes that need no token.
pub async fn public_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state.public_limiter, &request)?;
    Ok(next.run(request).await)
}

fn enforce(limiter: &RateLimiter, request: &Request<Body>) -> Result<(), AppError> {
    let ip = client_ip(request);
    limiter.check(&ip).map_err(|retry_after| {
        warn!("Rate limit hit for {} on {}", ip, request.uri().path());
        AppError::RateLimited { retry_after }
    })
}

/// First hop of `X-Forwarded-For`, then `X-Real-IP`, then the socket peer.
pub fn client_ip(request: &Request<Body>) -> String {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
