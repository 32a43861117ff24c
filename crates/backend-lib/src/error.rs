// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use crate::auth::{CredentialError, TokenError};
use crate::storage::DirectoryError;
use crate::validation::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use usergate_common::{ApiResponse, ResponseStatus};

/// Message shown for every failure whose details must stay server-side
pub const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Generic login failure; never says which half was wrong
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid request payload: {0}")]
    InvalidPayload(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No changes detected for the user")]
    NoChanges,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Request timed out")]
    Timeout,

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidPayload(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Auth(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::Directory(DirectoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            AppError::Conflict(_)
            | AppError::NoChanges
            | AppError::Directory(DirectoryError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::InvalidPayload(_) => "VAL_002",
            AppError::BadRequest(_) => "VAL_003",
            AppError::Auth(_) => "AUTH_001",
            AppError::InvalidCredentials => "AUTH_002",
            AppError::Forbidden(_) => "AUTH_003",
            AppError::NotFound(_) => "NF_001",
            AppError::Conflict(_) => "CONF_001",
            AppError::NoChanges => "CONF_002",
            AppError::RateLimitExceeded => "RATE_001",
            AppError::Timeout => "INT_002",
            AppError::Directory(DirectoryError::NotFound) => "NF_001",
            AppError::Directory(DirectoryError::Conflict(_)) => "CONF_001",
            AppError::Directory(_) => "DB_001",
            AppError::Credential(_) => "CRED_001",
            AppError::Token(_) => "TOKEN_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Envelope status: `info` for no-op updates, `error` otherwise
    pub fn response_status(&self) -> ResponseStatus {
        match self {
            AppError::NoChanges => ResponseStatus::Info,
            _ => ResponseStatus::Error,
        }
    }

    /// Message safe to show the client.
    ///
    /// Client-caused failures carry their specific message; dependency and
    /// internal failures collapse to [`INTERNAL_MESSAGE`].
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::InvalidPayload(_) => "Invalid request payload".to_string(),
            AppError::BadRequest(msg)
            | AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_string(),
            AppError::NoChanges => "No changes detected for the user".to_string(),
            AppError::RateLimitExceeded => "Too Many Requests".to_string(),
            AppError::Directory(DirectoryError::NotFound) => "User not found".to_string(),
            AppError::Directory(DirectoryError::Conflict(_)) => "User already exists".to_string(),
            AppError::Timeout
            | AppError::Directory(_)
            | AppError::Credential(_)
            | AppError::Token(_)
            | AppError::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        } else {
            tracing::debug!(error = %self, code = self.error_code(), "request rejected");
        }

        let body: ApiResponse = ApiResponse::new(
            status.as_u16(),
            self.response_status(),
            self.public_message(),
            None,
        );
        (status, Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {err}"))
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout
    }
}
