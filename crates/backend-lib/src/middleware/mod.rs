// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the user service.

pub mod auth;
pub mod rate_limit;

pub use auth::{require_bearer, AuthContext};
pub use rate_limit::rate_limit;
