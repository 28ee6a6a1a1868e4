//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, shutdown grace).
    pub listener: ListenerConfig,

    /// Token verification and exemption settings.
    pub auth: AuthConfig,

    /// Route definitions mapping path prefixes to upstreams.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Liveness endpoint served by the gateway itself.
    pub liveness: LivenessConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            auth: AuthConfig::default(),
            routes: default_routes(),
            timeouts: TimeoutConfig::default(),
            liveness: LivenessConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// How long in-flight requests may run after shutdown is requested.
    pub shutdown_grace_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            shutdown_grace_secs: 10,
        }
    }
}

/// Bearer token settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HMAC secret. Usually supplied through `JWT_SECRET`.
    pub secret: String,

    /// Expected `iss` claim. Any issuer is accepted when unset.
    pub issuer: Option<String>,

    /// Paths starting with one of these require a valid token.
    pub protected_prefixes: Vec<String>,

    /// Exact paths that never require a token.
    pub exempt_paths: Vec<String>,

    /// Path prefixes that never require a token.
    pub exempt_prefixes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: None,
            protected_prefixes: vec!["/api/".to_string()],
            exempt_paths: vec![
                "/healthz".to_string(),
                "/auth/login".to_string(),
                "/auth/refresh".to_string(),
                "/auth/.well-known/jwks.json".to_string(),
            ],
            exempt_prefixes: Vec::new(),
        }
    }
}

/// Route configuration mapping a path prefix to one upstream service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path prefix to match (e.g. "/api/a").
    pub path_prefix: String,

    /// Upstream base URL (e.g. "http://open-data:8000").
    #[serde(default)]
    pub upstream: String,

    /// Environment variable that overrides `upstream` when set.
    #[serde(default)]
    pub upstream_env: Option<String>,

    /// Remove the matched prefix before forwarding.
    #[serde(default = "default_true")]
    pub strip_prefix: bool,

    /// Require a valid token for every non-exempt path under this route.
    #[serde(default)]
    pub auth_required: bool,

    /// Per-route upstream timeout; falls back to `timeouts.upstream_secs`.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            name: "auth".to_string(),
            path_prefix: "/auth".to_string(),
            upstream: String::new(),
            upstream_env: Some("AUTH_SERVICE_URL".to_string()),
            strip_prefix: true,
            auth_required: true,
            timeout_secs: None,
        },
        RouteConfig {
            name: "open-data".to_string(),
            path_prefix: "/api/a".to_string(),
            upstream: String::new(),
            upstream_env: Some("OPEN_DATA_SERVICE_URL".to_string()),
            strip_prefix: true,
            auth_required: true,
            timeout_secs: None,
        },
        RouteConfig {
            name: "student-housing".to_string(),
            path_prefix: "/api/b".to_string(),
            upstream: String::new(),
            upstream_env: Some("STUDENT_HOUSING_SERVICE_URL".to_string()),
            strip_prefix: true,
            auth_required: true,
            timeout_secs: None,
        },
    ]
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Default time allowed for an upstream to answer, in seconds.
    pub upstream_secs: u64,

    /// Hard ceiling on total request handling time in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 15,
            request_secs: 60,
        }
    }
}

/// Liveness endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub path: String,
    pub body: String,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            path: "/healthz".to_string(),
            body: "ok".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
