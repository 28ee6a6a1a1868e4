//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Matched route + verified claims
//!     → forwarder.rs (rewrite URI, bounded client call)
//!     → headers.rs (hop-by-hop, X-Forwarded-*, identity)
//!     → target.rs (base URL, authority, timeout)
//!     → upstream response streamed back to the caller
//! ```

pub mod forwarder;
pub mod headers;
pub mod target;

pub use forwarder::{ForwardContext, Forwarder};
pub use target::{TargetError, UpstreamTarget};
