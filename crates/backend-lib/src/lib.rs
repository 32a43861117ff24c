// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core functionality for the `usergate` user-management service.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod validation;

use crate::auth::{CredentialVerifier, RateLimiter, TokenService};
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::error::AppError;
use chrono::TimeDelta;
use std::sync::Arc;
use std::time::Duration;

pub use router::create_router;

/// Application state shared across all handlers
pub struct AppState<D> {
    /// User directory backend
    pub directory: D,
    /// Token issuer and verifier
    pub tokens: Arc<TokenService>,
    /// Password hasher
    pub credentials: Arc<CredentialVerifier>,
    /// Per-client request limiter
    pub rate_limiter: Arc<RateLimiter>,
    pub clock: Arc<dyn Clock>,
    /// Deadline for read-only directory queries
    pub query_timeout: Duration,
}

impl<D> AppState<D> {
    /// Create a new application state driven by the system clock
    pub fn new(directory: D, settings: &Settings) -> Result<Self, AppError> {
        Self::with_clock(directory, settings, Arc::new(SystemClock))
    }

    /// Create a new application state with an explicit time source
    pub fn with_clock(
        directory: D,
        settings: &Settings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        let tokens = TokenService::with_ttl(
            settings.auth.jwt_secret.as_bytes(),
            seconds("auth.token_ttl_secs", settings.auth.token_ttl_secs)?,
        )?;
        let credentials = CredentialVerifier::new(settings.auth.hash)?;
        let rate_limiter = RateLimiter::new(
            settings.rate_limit.rate,
            settings.rate_limit.burst,
            seconds("rate_limit.window_secs", settings.rate_limit.window_secs)?,
        );

        Ok(Self {
            directory,
            tokens: Arc::new(tokens),
            credentials: Arc::new(credentials),
            rate_limiter: Arc::new(rate_limiter),
            clock,
            query_timeout: settings.storage.query_timeout(),
        })
    }
}

fn seconds(field: &str, secs: u64) -> Result<TimeDelta, AppError> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| AppError::Internal(format!("{field} is out of range")))
}
