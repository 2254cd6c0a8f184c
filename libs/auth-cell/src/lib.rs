pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod services;

pub use middleware::actor_middleware;
pub use services::guard;
pub use services::roles::resolve_role;
