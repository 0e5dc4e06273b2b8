//! Middleware for the storefront server.

pub mod auth;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_customer_auth, set_customer_auth};
pub use session::create_session_layer;
