//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the route for a request path (longest prefix wins)
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Routes sorted by prefix length once, so the first hit is the longest
//! - O(n) path prefix scan (acceptable for a handful of services)
//! - Explicit `None` rather than a silent default route

use std::sync::Arc;
use std::time::Duration;

use crate::config::{RouteConfig, TimeoutConfig};
use crate::routing::matcher::{strip_prefix, PathPrefixMatcher};
use crate::upstream::{Forwarder, TargetError, UpstreamTarget};

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    pub name: String,
    pub matcher: PathPrefixMatcher,
    pub strip_prefix: bool,
    pub auth_required: bool,
    pub forwarder: Forwarder,
}

impl Route {
    /// Path the upstream should see for `path`.
    ///
    /// `path` must be matched by this route.
    pub fn upstream_path<'a>(&self, path: &'a str) -> &'a str {
        if self.strip_prefix {
            strip_prefix(path, self.matcher.prefix()).unwrap_or(path)
        } else {
            path
        }
    }
}

/// Static mapping from path prefix to upstream.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    /// Compile routes from configuration, one pooled client per upstream.
    pub fn from_config(
        routes: &[RouteConfig],
        timeouts: &TimeoutConfig,
    ) -> Result<Self, TargetError> {
        let connect_timeout = Duration::from_secs(timeouts.connect_secs);
        let compiled = routes
            .iter()
            .map(|cfg| -> Result<Route, TargetError> {
                let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(timeouts.upstream_secs));
                let target = UpstreamTarget::new(&cfg.name, &cfg.upstream, timeout)?;
                Ok(Route {
                    name: cfg.name.clone(),
                    matcher: PathPrefixMatcher::new(&cfg.path_prefix),
                    strip_prefix: cfg.strip_prefix,
                    auth_required: cfg.auth_required,
                    forwarder: Forwarder::new(target, connect_timeout),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(compiled))
    }

    pub fn new(mut routes: Vec<Route>) -> Self {
        // Stable sort keeps config order among equal-length prefixes.
        routes.sort_by(|a, b| b.matcher.prefix().len().cmp(&a.matcher.prefix().len()));
        Self {
            routes: routes.into_iter().map(Arc::new).collect(),
        }
    }

    /// Find the route with the longest prefix covering `path`.
    pub fn match_path(&self, path: &str) -> Option<Arc<Route>> {
        self.routes
            .iter()
            .find(|route| route.matcher.matches(path))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(name: &str, prefix: &str, strip: bool) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            path_prefix: prefix.into(),
            upstream: "http://127.0.0.1:9000".into(),
            upstream_env: None,
            strip_prefix: strip,
            auth_required: true,
            timeout_secs: None,
        }
    }

    fn table(routes: &[RouteConfig]) -> RouteTable {
        RouteTable::from_config(routes, &TimeoutConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_longest_prefix_wins() {
        let table = table(&[
            route("api", "/api", true),
            route("a", "/api/a", true),
            route("root", "/", false),
        ]);

        assert_eq!(table.match_path("/api/a/widgets").unwrap().name, "a");
        assert_eq!(table.match_path("/api/ab").unwrap().name, "api");
        assert_eq!(table.match_path("/api/b/x").unwrap().name, "api");
        assert_eq!(table.match_path("/elsewhere").unwrap().name, "root");
    }

    #[tokio::test]
    async fn test_no_match() {
        let table = table(&[route("a", "/api/a", true), route("b", "/api/b", true)]);
        assert!(table.match_path("/api/c/x").is_none());
        assert!(table.match_path("/").is_none());
    }

    #[tokio::test]
    async fn test_upstream_path_stripping() {
        let table = table(&[route("a", "/api/a", true), route("raw", "/raw", false)]);

        let a = table.match_path("/api/a/foo").unwrap();
        assert_eq!(a.upstream_path("/api/a/foo"), "/foo");
        assert_eq!(a.upstream_path("/api/a"), "/");

        let raw = table.match_path("/raw/foo").unwrap();
        assert_eq!(raw.upstream_path("/raw/foo"), "/raw/foo");
    }

    #[tokio::test]
    async fn test_per_route_timeout() {
        let mut cfg = route("slow", "/slow", true);
        cfg.timeout_secs = Some(42);
        let table = table(&[cfg]);
        let slow = table.match_path("/slow").unwrap();
        assert_eq!(slow.forwarder.target().timeout, Duration::from_secs(42));
    }
}
