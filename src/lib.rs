//! Authenticating reverse proxy for the campus services.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http::server ──▶ liveness? ──yes──▶ 200 "ok"
//!                         │
//!                         ▼
//!                  http::pipeline
//!          ┌──────────────┼───────────────┐
//!          ▼              ▼               ▼
//!    exempt check    auth check      route match
//!    (auth::policy) (auth::verifier) (routing::router)
//!                                         │
//!                                         ▼
//!                               upstream::forwarder ─────▶ Backend service
//!     Client Response                     │
//!     ◀───────────────────────────────────┘ (streamed)
//!
//!     Cross-cutting: config, error, lifecycle, observability
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod upstream;

pub use config::GatewayConfig;
pub use error::{GatewayError, UpstreamError};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
