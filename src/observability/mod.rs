//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - One structured access line per request (method, path, status, latency)
//! - Request ID flows through logs, upstream requests and responses
//! - Metrics are cheap (atomic increments) and off by default

pub mod logging;
pub mod metrics;
