//! Header rewriting between caller and upstream.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Append X-Forwarded-* for the upstream
//! - Replace identity headers with values from verified claims
//!
//! # Design Decisions
//! - Identity headers from the caller are always removed, even on exempt paths
//! - Framing headers on responses are left to hyper (content-length kept)

use std::net::IpAddr;

use axum::http::{
    header::{self, HeaderName},
    HeaderMap, HeaderValue,
};

use crate::auth::Claims;

pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const X_USER_ROLE: HeaderName = HeaderName::from_static("x-user-role");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Append the caller to `X-Forwarded-For` and record host/proto.
pub fn append_forwarded(headers: &mut HeaderMap, client_ip: Option<IpAddr>) {
    if let Some(ip) = client_ip {
        let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(prior) => format!("{}, {}", prior, ip),
            None => ip.to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    if !headers.contains_key(&X_FORWARDED_HOST) {
        if let Some(host) = headers.get(header::HOST).cloned() {
            headers.insert(X_FORWARDED_HOST, host);
        }
    }
    if !headers.contains_key(&X_FORWARDED_PROTO) {
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
    }
}

/// Drop caller-supplied identity headers and set them from `claims`.
pub fn set_identity(headers: &mut HeaderMap, claims: Option<&Claims>) {
    headers.remove(&X_USER_ID);
    headers.remove(&X_USER_ROLE);

    let Some(claims) = claims else {
        return;
    };
    if let Ok(value) = HeaderValue::from_str(&claims.sub) {
        headers.insert(X_USER_ID, value);
    }
    if let Ok(value) = HeaderValue::from_str(claims.role.as_str()) {
        headers.insert(X_USER_ROLE, value);
    }
}
