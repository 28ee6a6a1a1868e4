//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::upstream::TargetError;

/// Environment variable holding the shared signing secret.
pub const ENV_SECRET: &str = "JWT_SECRET";
/// Environment variable pinning the expected token issuer.
pub const ENV_ISSUER: &str = "ISSUER";
/// Environment variable overriding the listen address.
pub const ENV_LISTEN_ADDR: &str = "GATEWAY_LISTEN_ADDR";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Upstream error: {0}")]
    Upstream(#[from] TargetError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply process environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML document into a configuration without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay environment values onto the parsed configuration.
///
/// Empty values are ignored so an unset-but-exported variable cannot blank
/// out a value from the file.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(secret) = lookup(ENV_SECRET) {
        config.auth.secret = secret;
    }
    if let Some(issuer) = lookup(ENV_ISSUER) {
        config.auth.issuer = Some(issuer);
    }
    if let Some(addr) = lookup(ENV_LISTEN_ADDR) {
        config.listener.bind_address = addr;
    }
    for route in &mut config.routes {
        if let Some(url) = route.upstream_env.as_deref().and_then(lookup) {
            route.upstream = url;
        }
    }
}
