//! Bearer-token authentication.
use crate::metrics::TOKEN_REJECTED;
use crate::storage::UserDirectory;
use crate::{error::AppError, AppState};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use usergate_common::UserId;

/// Identity attached to a request once its token has been verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl AuthContext {
    /// Fail unless the caller holds the admin role
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Unauthorized only admin can access".to_string(),
            ))
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The header must be exactly two space-separated parts with a `Bearer` scheme.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AppError> {
    let header = header
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AppError::Auth("Unauthorized".to_string()))?;

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AppError::Auth("Invalid auth token".to_string())),
    }
}

/// Verify the bearer token and store an [`AuthContext`] in the request extensions
pub async fn require_bearer<D: UserDirectory>(
    State(state): State<Arc<AppState<D>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|h| h.to_str().unwrap_or_default());
    let token = bearer_token(header)?;

    let claims = state.tokens.verify(token, state.clock.now()).map_err(|e| {
        metrics::counter!(TOKEN_REJECTED).increment(1);
        tracing::debug!(reason = %e, "bearer token rejected");
        AppError::Auth("Invalid auth token".to_string())
    })?;

    request.extensions_mut().insert(AuthContext {
        user_id: claims.user_id,
        is_admin: claims.is_admin,
    });

    Ok(next.run(request).await)
}
