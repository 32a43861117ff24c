use crate::metrics::RATE_LIMIT_REJECTED;
use crate::storage::UserDirectory;
use crate::{error::AppError, AppState};
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;

/// Header consulted when no socket address is attached to the request
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Key used to bucket a request: the peer IP, else `x-real-ip`, else "unknown"
pub fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get(REAL_IP_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Rate limiter middleware
pub async fn rate_limit<D: UserDirectory>(
    State(state): State<Arc<AppState<D>>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(&request);
    let now = state.clock.now();

    if !state.rate_limiter.admit(&key, now) {
        metrics::counter!(RATE_LIMIT_REJECTED).increment(1);
        tracing::warn!(client = %key, "rate limit exceeded");
        return Err(AppError::RateLimitExceeded);
    }

    // Continue to next middleware/handler
    Ok(next.run(request).await)
}
