//! HTTP handlers.
pub mod users;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use usergate_common::ApiResponse;

/// Render an envelope with its status code
pub(crate) fn respond<T: Serialize>(envelope: ApiResponse<T>) -> impl IntoResponse {
    let status = StatusCode::from_u16(envelope.code).unwrap_or(StatusCode::OK);
    (status, Json(envelope))
}
