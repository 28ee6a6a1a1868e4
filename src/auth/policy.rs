//! Which paths need a bearer token.
//!
//! # Design Decisions
//! - Exemptions win over everything (route flags and protected prefixes)
//! - Exact exemptions are compared byte-for-byte; no normalization
//! - Built once from config and never mutated

use std::collections::HashSet;

use crate::config::AuthConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// Exemption set plus the protected-prefix convention.
#[derive(Debug, Clone, Default)]
pub struct AuthPolicy {
    exempt_paths: HashSet<String>,
    exempt_prefixes: Vec<PathPrefixMatcher>,
    protected_prefixes: Vec<PathPrefixMatcher>,
}

impl AuthPolicy {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            exempt_paths: config.exempt_paths.iter().cloned().collect(),
            exempt_prefixes: config
                .exempt_prefixes
                .iter()
                .map(PathPrefixMatcher::new)
                .collect(),
            protected_prefixes: config
                .protected_prefixes
                .iter()
                .map(PathPrefixMatcher::new)
                .collect(),
        }
    }

    /// True if the path bypasses authentication entirely.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.contains(path) || self.exempt_prefixes.iter().any(|m| m.matches(path))
    }

    /// True if the path falls under a protected prefix.
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes.iter().any(|m| m.matches(path))
    }
}
