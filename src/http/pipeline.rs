//! Request pipeline.
//!
//! Each request walks a fixed chain of stages over a typed [`RequestContext`]:
//!
//! ```text
//! RECEIVED → EXEMPT_CHECK → AUTH_CHECK → ROUTE_MATCH → FORWARDING → RESPONDED
//!                               │             │             │
//!                               └── 401 ──────┴── 404 ──────┴── 502/504 (REJECTED)
//! ```
//!
//! A stage either lets the context continue or rejects the request with a
//! [`GatewayError`]; no stage after a rejection runs, so a rejected request
//! never reaches an upstream.

use std::net::IpAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::auth::{bearer_token, AuthPolicy, Claims, TokenVerifier};
use crate::error::GatewayError;
use crate::routing::{Route, RouteTable};
use crate::upstream::ForwardContext;

/// Per-request state threaded through the stages.
#[derive(Debug)]
pub struct RequestContext {
    pub request: Request<Body>,
    pub request_id: String,
    pub client_ip: Option<IpAddr>,
    /// Set by the exemption check.
    pub exempt: bool,
    /// Set by the auth check when a token was verified.
    pub claims: Option<Claims>,
    /// Set by route matching.
    pub route: Option<Arc<Route>>,
}

impl RequestContext {
    pub fn new(request: Request<Body>, request_id: String, client_ip: Option<IpAddr>) -> Self {
        Self {
            request,
            request_id,
            client_ip,
            exempt: false,
            claims: None,
            route: None,
        }
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }
}

/// Route that served a response, stored in the response extensions.
#[derive(Debug, Clone)]
pub struct MatchedRoute(pub String);

/// One synchronous step before forwarding.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Inspect or enrich the context, or reject the request.
    fn apply(&self, ctx: &mut RequestContext) -> Result<(), GatewayError>;
}

/// Marks paths from the exemption set.
pub struct ExemptCheck {
    policy: Arc<AuthPolicy>,
}

impl ExemptCheck {
    pub fn new(policy: Arc<AuthPolicy>) -> Self {
        Self { policy }
    }
}

impl Stage for ExemptCheck {
    fn name(&self) -> &'static str {
        "exempt_check"
    }

    fn apply(&self, ctx: &mut RequestContext) -> Result<(), GatewayError> {
        ctx.exempt = self.policy.is_exempt(ctx.path());
        Ok(())
    }
}

/// Requires a valid bearer token on protected, non-exempt paths.
///
/// A path is protected when it falls under a protected prefix or its route
/// is flagged `auth_required`.
pub struct AuthCheck {
    verifier: TokenVerifier,
    policy: Arc<AuthPolicy>,
    routes: Arc<RouteTable>,
}

impl AuthCheck {
    pub fn new(verifier: TokenVerifier, policy: Arc<AuthPolicy>, routes: Arc<RouteTable>) -> Self {
        Self {
            verifier,
            policy,
            routes,
        }
    }

    fn requires_auth(&self, path: &str) -> bool {
        self.policy.is_protected(path)
            || self
                .routes
                .match_path(path)
                .is_some_and(|route| route.auth_required)
    }
}

impl Stage for AuthCheck {
    fn name(&self) -> &'static str {
        "auth_check"
    }

    fn apply(&self, ctx: &mut RequestContext) -> Result<(), GatewayError> {
        if ctx.exempt || !self.requires_auth(ctx.path()) {
            return Ok(());
        }
        let token = bearer_token(ctx.request.headers())?;
        let claims = self.verifier.verify(token)?;
        tracing::debug!(
            request_id = %ctx.request_id,
            subject = %claims.sub,
            role = %claims.role,
            "Token verified"
        );
        ctx.claims = Some(claims);
        Ok(())
    }
}

/// Resolves the route; no match is a 404.
pub struct RouteMatch {
    routes: Arc<RouteTable>,
}

impl RouteMatch {
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self { routes }
    }
}

impl Stage for RouteMatch {
    fn name(&self) -> &'static str {
        "route_match"
    }

    fn apply(&self, ctx: &mut RequestContext) -> Result<(), GatewayError> {
        match self.routes.match_path(ctx.path()) {
            Some(route) => {
                ctx.route = Some(route);
                Ok(())
            }
            None => Err(GatewayError::NoRoute(ctx.path().to_string())),
        }
    }
}

/// Ordered stages followed by the forwarding step.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// The gateway's standard chain: exemption, auth, route match.
    pub fn standard(verifier: TokenVerifier, policy: AuthPolicy, routes: Arc<RouteTable>) -> Self {
        let policy = Arc::new(policy);
        Self::new(vec![
            Box::new(ExemptCheck::new(policy.clone())),
            Box::new(AuthCheck::new(verifier, policy, routes.clone())),
            Box::new(RouteMatch::new(routes)),
        ])
    }

    /// Names of the configured stages, in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage, then forward to the matched upstream.
    pub async fn run(&self, mut ctx: RequestContext) -> Result<Response<Body>, GatewayError> {
        for stage in &self.stages {
            if let Err(err) = stage.apply(&mut ctx) {
                tracing::debug!(
                    request_id = %ctx.request_id,
                    stage = stage.name(),
                    reason = %err,
                    "Request rejected"
                );
                return Err(err);
            }
        }

        let route = ctx
            .route
            .take()
            .ok_or_else(|| GatewayError::Internal("pipeline finished without a route".into()))?;

        let path = ctx.path().to_string();
        let forward_ctx = ForwardContext {
            upstream_path: route.upstream_path(&path),
            claims: ctx.claims.as_ref(),
            client_ip: ctx.client_ip,
        };

        let mut response = route.forwarder.forward(ctx.request, forward_ctx).await?;
        response
            .extensions_mut()
            .insert(MatchedRoute(route.name.clone()));
        Ok(response)
    }
}
