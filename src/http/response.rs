//! Responses produced by the gateway itself.
//!
//! Upstream responses are streamed through untouched (see `upstream`);
//! this module only covers the liveness answer and the error boundary.

use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
    response::IntoResponse,
};

use crate::error::GatewayError;

/// Fixed 200 for the liveness path.
pub fn liveness(body: &str) -> Response<Body> {
    let mut response = (StatusCode::OK, body.to_string()).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    response
}

/// Log a per-request failure with its internal detail and convert it.
pub fn reject(err: GatewayError, request_id: &str) -> Response<Body> {
    match &err {
        GatewayError::Auth(reason) => {
            tracing::warn!(request_id = %request_id, reason = %reason, "Authentication failed");
        }
        GatewayError::NoRoute(path) => {
            tracing::warn!(request_id = %request_id, path = %path, "No route matched");
        }
        GatewayError::Upstream(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
        }
        GatewayError::Internal(detail) => {
            tracing::error!(request_id = %request_id, error = %detail, "Internal error while proxying");
        }
    }
    err.into_response()
}
