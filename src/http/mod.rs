//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, liveness short-circuit)
//!     → request.rs (request ID, caller address)
//!     → pipeline.rs (exempt check → auth check → route match → forward)
//!     → response.rs (error boundary: GatewayError → status + body)
//!     → Send to client
//! ```

pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use pipeline::{Pipeline, RequestContext, Stage};
pub use request::X_REQUEST_ID;
pub use server::{AppState, GatewayServer};
