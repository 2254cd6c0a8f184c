use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use tracing::debug;

use shared_database::AppState;
use shared_models::auth::{Actor, User};
use shared_models::error::AppError;

use crate::services::roles::resolve_role;

/// Runs after `auth_middleware`: resolves the caller's application role and
/// stores the resulting `Actor` for handlers.
pub async fn actor_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request".to_string()))?;

    let role = resolve_role(state.store.as_ref(), user.role.as_deref(), &user.id).await;
    debug!("Request by {} resolved to role {}", user.id, role);

    request
        .extensions_mut()
        .insert(Actor::new(user.id, user.email, role));

    Ok(next.run(request).await)
}
