//! Upstream target description.
//!
//! # Responsibilities
//! - Represent one backend service (name, base URL, timeout)
//! - Pre-compute the URI authority and base path used on every request

use std::time::Duration;

use axum::http::uri::Authority;
use url::Url;

/// Reasons an upstream base URL cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("invalid upstream URL '{0}': {1}")]
    Parse(String, url::ParseError),

    #[error("upstream URL '{0}' must be plain http with a host")]
    Unsupported(String),
}

/// A single backend service.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    /// Name used in logs and metrics.
    pub name: String,
    /// Base URL as configured.
    pub base_url: Url,
    /// Upper bound on waiting for the upstream's response.
    pub timeout: Duration,
    authority: Authority,
}

impl UpstreamTarget {
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, TargetError> {
        let url =
            Url::parse(base_url).map_err(|e| TargetError::Parse(base_url.to_string(), e))?;
        if url.scheme() != "http" {
            return Err(TargetError::Unsupported(base_url.to_string()));
        }
        let host = url
            .host_str()
            .ok_or_else(|| TargetError::Unsupported(base_url.to_string()))?;
        let port = url.port_or_known_default().unwrap_or(80);
        let authority = format!("{}:{}", host, port)
            .parse::<Authority>()
            .map_err(|_| TargetError::Unsupported(base_url.to_string()))?;

        Ok(Self {
            name: name.into(),
            base_url: url,
            timeout,
            authority,
        })
    }

    /// `host:port` of the upstream.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Path component of the base URL ("/" when none was given).
    pub fn base_path(&self) -> &str {
        self.base_url.path()
    }
}
