//! Request forwarding to a single upstream.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the upstream (path + original query)
//! - Strip hop-by-hop headers, add X-Forwarded-*, inject identity
//! - Bound the upstream call by the target timeout
//! - Stream the upstream response back without buffering
//!
//! # Design Decisions
//! - One pooled client per upstream, built at startup and reused
//! - No retries: a failure is reported once
//! - Dropping the returned future drops the upstream call, so a caller
//!   disconnect cancels the in-flight request

use std::net::IpAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{uri::Scheme, Request, Response, Uri, Version};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};

use crate::auth::Claims;
use crate::error::{GatewayError, UpstreamError};
use crate::routing::matcher::join_paths;
use crate::upstream::headers::{append_forwarded, set_identity, strip_hop_by_hop};
use crate::upstream::target::UpstreamTarget;

/// Everything the forwarder needs besides the request itself.
#[derive(Debug, Clone, Copy)]
pub struct ForwardContext<'a> {
    /// Path the upstream should see (already stripped).
    pub upstream_path: &'a str,
    /// Verified identity, if the request was authenticated.
    pub claims: Option<&'a Claims>,
    /// Peer address of the caller.
    pub client_ip: Option<IpAddr>,
}

/// HTTP client bound to one upstream target.
#[derive(Debug, Clone)]
pub struct Forwarder {
    target: UpstreamTarget,
    client: Client<HttpConnector, Body>,
}

impl Forwarder {
    /// Build the pooled client for `target`.
    pub fn new(target: UpstreamTarget, connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .build(connector);

        Self { target, client }
    }

    pub fn target(&self) -> &UpstreamTarget {
        &self.target
    }

    /// Forward `request` and return the upstream response as a stream.
    pub async fn forward(
        &self,
        request: Request<Body>,
        ctx: ForwardContext<'_>,
    ) -> Result<Response<Body>, GatewayError> {
        let request = self.rewrite(request, ctx)?;

        tracing::debug!(
            upstream = %self.target.name,
            uri = %request.uri(),
            "Forwarding request"
        );

        let response = match tokio::time::timeout(self.target.timeout, self.client.request(request))
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                return Err(UpstreamError::Unreachable {
                    upstream: self.target.name.clone(),
                    source,
                }
                .into())
            }
            Err(_) => {
                return Err(UpstreamError::Timeout {
                    upstream: self.target.name.clone(),
                    after: self.target.timeout,
                }
                .into())
            }
        };

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    /// Build the outbound request: new URI, cleaned headers, same body stream.
    fn rewrite(
        &self,
        request: Request<Body>,
        ctx: ForwardContext<'_>,
    ) -> Result<Request<Body>, GatewayError> {
        let (mut parts, body) = request.into_parts();

        let path = join_paths(self.target.base_path(), ctx.upstream_path);
        let path_and_query = match parts.uri.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        };

        parts.uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.target.authority().clone())
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| GatewayError::Internal(format!("upstream URI: {}", e)))?;
        // The pooled client speaks HTTP/1.1 to upstreams regardless of the
        // inbound protocol.
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);
        append_forwarded(&mut parts.headers, ctx.client_ip);
        set_identity(&mut parts.headers, ctx.claims);

        Ok(Request::from_parts(parts, body))
    }
}
