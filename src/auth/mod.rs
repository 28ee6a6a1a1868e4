//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Request path
//!     → policy.rs (exempt? protected?)
//!     → verifier.rs (Authorization header → token → Claims)
//!     → Claims attached to the request context
//!     → identity headers injected by the forwarder
//! ```
//!
//! # Design Decisions
//! - Single accepted algorithm (HS256); the header is checked before the signature
//! - Verification is a pure function of token, secret and clock
//! - Failure reasons are distinct internally, uniform (401) externally

pub mod claims;
pub mod policy;
pub mod verifier;

pub use claims::{Claims, Role};
pub use policy::AuthPolicy;
pub use verifier::{bearer_token, verify, AuthError, TokenVerifier};
