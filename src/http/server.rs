//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the liveness and gateway handlers
//! - Wire up middleware (tracing, request ID, request timeout)
//! - Bind server to listener
//! - Dispatch requests through the auth/route pipeline
//! - Graceful shutdown with a bounded grace period
//!
//! # Design Decisions
//! - Connections are served from our own accept loop and tracked in a
//!   `JoinSet`, so `run` aborts whatever is left when the grace period runs
//!   out and returns only once every connection is closed
//! - The whole-request timeout answers 504: it can only fire while an
//!   upstream is still working on the request

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, Response, StatusCode},
    routing::any,
    Router,
};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::{
    rt::{TokioIo, TokioTimer},
    server::graceful::GracefulShutdown,
    service::TowerToHyperService,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tower::ServiceExt;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{AuthPolicy, TokenVerifier};
use crate::config::{validate_config, ConfigError, GatewayConfig};
use crate::http::pipeline::{MatchedRoute, Pipeline, RequestContext};
use crate::http::{request, response};
use crate::observability::metrics;
use crate::routing::RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub liveness_body: Arc<str>,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    routes: Arc<RouteTable>,
}

impl GatewayServer {
    /// Build the server from a validated configuration.
    ///
    /// Upstream clients are created here, once, and shared by every request.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let routes = Arc::new(RouteTable::from_config(&config.routes, &config.timeouts)?);
        let verifier = TokenVerifier::new(config.auth.secret.as_bytes(), config.auth.issuer.as_deref());
        let policy = AuthPolicy::from_config(&config.auth);

        let state = AppState {
            pipeline: Arc::new(Pipeline::standard(verifier, policy, routes.clone())),
            liveness_body: Arc::from(config.liveness.body.as_str()),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            routes,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route(&config.liveness.path, any(liveness_handler))
            .fallback(gateway_handler)
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::GATEWAY_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain for at most the
    /// configured grace period.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes.len(),
            "HTTP server starting"
        );
        for route in self.routes.routes() {
            tracing::info!(
                route = %route.name,
                prefix = %route.matcher.prefix(),
                upstream = %route.forwarder.target().base_url,
                auth_required = route.auth_required,
                "Route registered"
            );
        }

        let grace = Duration::from_secs(self.config.listener.shutdown_grace_secs);
        let mut http = http1::Builder::new();
        http.timer(TokioTimer::new());
        let graceful = GracefulShutdown::new();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };
                    let service = self.router.clone().map_request(move |mut req: Request<Incoming>| {
                        req.extensions_mut().insert(ConnectInfo(peer));
                        req
                    });
                    let conn = http
                        .serve_connection(TokioIo::new(stream), TowerToHyperService::new(service));
                    let conn = graceful.watch(conn);
                    connections.spawn(async move {
                        if let Err(e) = conn.await {
                            tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
                        }
                    });
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                _ = shutdown.recv() => break,
            }
        }

        drop(listener);
        tracing::info!(
            grace_secs = grace.as_secs(),
            open_connections = connections.len(),
            "Shutdown signal received, draining"
        );

        tokio::select! {
            _ = graceful.shutdown() => {}
            _ = tokio::time::sleep(grace) => {
                tracing::warn!(
                    open_connections = connections.len(),
                    "Grace period elapsed, closing remaining connections"
                );
            }
        }
        connections.shutdown().await;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Liveness: fixed 200 for any method, outside the pipeline.
async fn liveness_handler(State(state): State<AppState>) -> Response<Body> {
    response::liveness(&state.liveness_body)
}

/// Every other path goes through the pipeline.
async fn gateway_handler(State(state): State<AppState>, req: Request<Body>) -> Response<Body> {
    let start_time = Instant::now();
    let request_id = request::request_id(&req);
    let client_ip = request::client_ip(&req);
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let ctx = RequestContext::new(req, request_id.clone(), client_ip);
    let response = match state.pipeline.run(ctx).await {
        Ok(response) => response,
        Err(err) => response::reject(err, &request_id),
    };

    let route = response
        .extensions()
        .get::<MatchedRoute>()
        .map(|r| r.0.as_str())
        .unwrap_or("none");
    let status = response.status().as_u16();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status,
        route = %route,
        latency_ms = start_time.elapsed().as_millis() as u64,
        "Request completed"
    );
    metrics::record_request(&method, status, route, start_time);

    response
}
