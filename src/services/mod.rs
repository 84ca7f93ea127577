//! Account and user management services.

pub mod auth;
pub mod users;

pub use auth::configure_routes as configure_auth_routes;
pub use users::configure_routes as configure_user_routes;
