// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const TOKEN_REJECTED: &str = "token.rejected";
pub const RATE_LIMIT_REJECTED: &str = "rate_limit.rejected";
pub const USERS_CREATED: &str = "users.created";
pub const USERS_UPDATED: &str = "users.updated";
pub const USERS_DELETED: &str = "users.deleted";
