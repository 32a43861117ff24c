// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request payload validation.
//!
//! One function per request shape. Checks run in a fixed order and the first
//! failure wins; later checks are not evaluated.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use usergate_common::{LoginRequest, RegisterRequest, UpdateUserRequest};

/// Minimum password length, counted on the raw (untrimmed) input
pub const MIN_PASSWORD_LENGTH: usize = 5;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern compiles")
});

/// Possible validation errors. The display text is what the client sees.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Password must be at least 5 characters")]
    PasswordTooShort,

    #[error("Invalid email format")]
    InvalidEmail,
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Flatten a validation result into the `(message, ok)` pair used on the wire
pub fn message_pair(result: &ValidationResult<()>) -> (String, bool) {
    match result {
        Ok(()) => (String::new(), true),
        Err(e) => (e.to_string(), false),
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn require_username(username: &str) -> ValidationResult<()> {
    if is_blank(username) {
        return Err(ValidationError::EmptyUsername);
    }
    Ok(())
}

fn require_email(email: &str) -> ValidationResult<()> {
    if is_blank(email) {
        return Err(ValidationError::EmptyEmail);
    }
    Ok(())
}

fn require_password(password: &str) -> ValidationResult<()> {
    if is_blank(password) {
        return Err(ValidationError::EmptyPassword);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Check the shape of an email address (`local@domain.tld`)
pub fn validate_email_format(email: &str) -> ValidationResult<()> {
    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// username → email → password → password length → email format
pub fn validate_register_request(req: &RegisterRequest) -> ValidationResult<()> {
    require_username(&req.username)?;
    require_email(&req.email)?;
    require_password(&req.password)?;
    validate_email_format(&req.email)
}

/// username → password → password length
pub fn validate_login_request(req: &LoginRequest) -> ValidationResult<()> {
    require_username(&req.username)?;
    require_password(&req.password)
}

/// Same rules as registration
pub fn validate_update_user_request(req: &UpdateUserRequest) -> ValidationResult<()> {
    require_username(&req.username)?;
    require_email(&req.email)?;
    require_password(&req.password)?;
    validate_email_format(&req.email)
}
