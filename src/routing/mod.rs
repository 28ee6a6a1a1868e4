//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (route lookup)
//!     → matcher.rs (segment-aware prefix match)
//!     → Return: matched Route or None (404)
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Normalize prefixes, build one Forwarder per upstream
//!     → Sort by prefix length (longest first)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same path always matches same route

pub mod matcher;
pub mod router;

pub use matcher::{join_paths, normalize_prefix, strip_prefix, PathPrefixMatcher};
pub use router::{Route, RouteTable};
