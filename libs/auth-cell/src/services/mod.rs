pub mod guard;
pub mod roles;
pub mod users;
