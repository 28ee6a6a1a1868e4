//! Path prefix matching and rewriting.
//!
//! # Responsibilities
//! - Match path prefix on segment boundaries (case-sensitive)
//! - Strip a matched prefix so the upstream sees a path relative to its root
//! - Join a stripped path onto an upstream base path
//!
//! # Design Decisions
//! - Prefixes are normalized without a trailing slash ("/api/a/" == "/api/a")
//! - "/api/a" matches "/api/a" and "/api/a/..." but never "/api/ab"
//! - Stripping a prefix equal to the whole path yields "/"
//! - No regex to guarantee O(n) matching

/// Normalize a configured prefix: trailing slashes removed, root kept as "/".
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Matches the request path against a normalized prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl AsRef<str>) -> Self {
        Self {
            prefix: normalize_prefix(prefix.as_ref()),
        }
    }

    /// The normalized prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if the path falls under this prefix.
    pub fn matches(&self, path: &str) -> bool {
        strip_prefix(path, &self.prefix).is_some()
    }
}

/// Remove `prefix` from `path`.
///
/// `prefix` must already be normalized. Returns `None` when the path is not
/// under the prefix. The result always starts with '/'.
pub fn strip_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix == "/" {
        return path.starts_with('/').then_some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Join an upstream base path and a request path with exactly one slash.
pub fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
    }
    match path.strip_prefix('/') {
        Some(rest) => format!("{}/{}", base, rest),
        None => format!("{}/{}", base, path),
    }
}
