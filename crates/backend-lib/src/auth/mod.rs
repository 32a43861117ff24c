// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.
pub mod password;
pub mod rate_limit;
pub mod token;

pub use password::{CredentialError, CredentialVerifier, HashCost};
pub use rate_limit::{RateLimiter, RateWindow};
pub use token::{Claims, TokenError, TokenService, TOKEN_TTL_SECS};
