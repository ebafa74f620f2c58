//! Client address extraction from HTTP headers
//!
//! The service is deployed behind a reverse proxy, so forwarding headers
//! take precedence over the socket peer address:
//! - `X-Forwarded-For` (first entry)
//! - `X-Real-IP`
//! - the transport peer address
//! - the literal `unknown`

use axum::http::{header, HeaderMap};
use std::net::SocketAddr;

use crate::analytics::visitor::UNKNOWN;

/// Extract the client address as a string, following proxy headers
pub fn extract_client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(ip) = extract_from_x_forwarded_for(headers) {
        return ip;
    }

    if let Some(ip) = header_value(headers, "x-real-ip") {
        return ip;
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Extract the user agent, or `unknown` when absent
pub fn extract_user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// First comma separated entry of X-Forwarded-For
fn extract_from_x_forwarded_for(headers: &HeaderMap) -> Option<String> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;
    xff.split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
