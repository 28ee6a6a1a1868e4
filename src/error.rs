//! Per-request error taxonomy and its mapping onto HTTP responses.
//!
//! Every failure that can happen while handling a request ends up as a
//! [`GatewayError`]. The server converts it into a status code plus a short,
//! generic JSON body; the detailed reason only goes to the logs.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

/// Failures talking to an upstream service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream '{upstream}' did not respond within {after:?}")]
    Timeout { upstream: String, after: Duration },

    #[error("upstream '{upstream}' unreachable: {source}")]
    Unreachable {
        upstream: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },
}

/// Anything that can end a request before a successful upstream response.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("no route for path '{0}'")]
    NoRoute(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Auth(_) => StatusCode::UNAUTHORIZED,
            GatewayError::NoRoute(_) => StatusCode::NOT_FOUND,
            GatewayError::Upstream(UpstreamError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Upstream(UpstreamError::Unreachable { .. }) => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller (no internal detail).
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::Auth(_) => "unauthorized",
            GatewayError::NoRoute(_) => "not found",
            GatewayError::Upstream(UpstreamError::Timeout { .. }) => "upstream timed out",
            GatewayError::Upstream(UpstreamError::Unreachable { .. }) => "upstream unavailable",
            GatewayError::Internal(_) => "internal server error",
        }
    }

    /// Short machine-readable kind for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Auth(_) => "auth",
            GatewayError::NoRoute(_) => "route",
            GatewayError::Upstream(UpstreamError::Timeout { .. }) => "upstream_timeout",
            GatewayError::Upstream(UpstreamError::Unreachable { .. }) => "upstream_unreachable",
            GatewayError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(json!({ "error": self.public_message() }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}
