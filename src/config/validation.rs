//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every route has a usable upstream URL
//! - Validate value ranges (timeouts > 0, bind address parses)
//! - Detect conflicting routes (duplicate prefixes)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::routing::matcher::normalize_prefix;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("auth.secret is empty (set JWT_SECRET)")]
    MissingSecret,

    #[error("invalid listener.bind_address '{0}'")]
    InvalidBindAddress(String),

    #[error("no routes configured")]
    NoRoutes,

    #[error("route '{route}': missing upstream URL")]
    MissingUpstream { route: String },

    #[error("route '{route}': invalid upstream URL '{url}'")]
    InvalidUpstream { route: String, url: String },

    #[error("route '{route}': path_prefix '{prefix}' must start with '/'")]
    InvalidPrefix { route: String, prefix: String },

    #[error("route '{route}': path_prefix '{prefix}' is already used")]
    DuplicatePrefix { route: String, prefix: String },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: String },

    #[error("liveness.path '{0}' must start with '/' and be a literal path")]
    InvalidLivenessPath(String),
}

/// Validate a fully loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.secret.trim().is_empty() {
        errors.push(ValidationError::MissingSecret);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if !is_literal_path(&config.liveness.path) {
        errors.push(ValidationError::InvalidLivenessPath(
            config.liveness.path.clone(),
        ));
    }

    for (field, value) in [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout {
                field: field.to_string(),
            });
        }
    }

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }

    let mut seen = HashSet::new();
    for route in &config.routes {
        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix {
                route: route.name.clone(),
                prefix: route.path_prefix.clone(),
            });
        } else if !seen.insert(normalize_prefix(&route.path_prefix)) {
            errors.push(ValidationError::DuplicatePrefix {
                route: route.name.clone(),
                prefix: route.path_prefix.clone(),
            });
        }

        if route.upstream.trim().is_empty() {
            errors.push(ValidationError::MissingUpstream {
                route: route.name.clone(),
            });
        } else if !is_http_url(&route.upstream) {
            errors.push(ValidationError::InvalidUpstream {
                route: route.name.clone(),
                url: route.upstream.clone(),
            });
        }

        if route.timeout_secs == Some(0) {
            errors.push(ValidationError::ZeroTimeout {
                field: format!("routes.{}.timeout_secs", route.name),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A path the router takes literally: no captures, wildcards or legacy
/// `:param` segments.
fn is_literal_path(path: &str) -> bool {
    path.starts_with('/') && !path.contains(['{', '}', '*', ':'])
}

fn is_http_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => url.scheme() == "http" && url.host_str().is_some(),
        Err(_) => false,
    }
}
