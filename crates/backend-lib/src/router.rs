// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP routing for the `/api/v1` surface.
use crate::handlers::users::{delete_user, get_users, login, register, update_user};
use crate::middleware::{rate_limit, require_bearer};
use crate::storage::UserDirectory;
use crate::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the API router.
///
/// `/users` requires a bearer token; every route passes through the rate limiter.
pub fn create_router<D: UserDirectory>(state: Arc<AppState<D>>) -> Router {
    let protected = Router::new()
        .route(
            "/api/v1/users",
            get(get_users::<D>).put(update_user::<D>).delete(delete_user::<D>),
        )
        .route_layer(from_fn_with_state(state.clone(), require_bearer::<D>));

    Router::new()
        .route("/api/v1/register", post(register::<D>))
        .route("/api/v1/login", post(login::<D>))
        .merge(protected)
        .layer(from_fn_with_state(state.clone(), rate_limit::<D>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
