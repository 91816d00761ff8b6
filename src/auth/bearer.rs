//! Bearer credential extraction.
//!
//! Only `Authorization: Bearer <token>` is accepted. The scheme is matched
//! case-sensitively and everything after the single separating space is the
//! token, which must be non-empty. Judging the token is left to the verifier.

use axum::http::{header, HeaderMap};

/// Scheme prefix including the single separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Extract the bearer token from request headers.
///
/// Returns `None` for an absent, non-UTF-8 or malformed header.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    parse_bearer(value)
}

/// Parse a raw `Authorization` header value.
pub fn parse_bearer(value: &str) -> Option<&str> {
    value
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
}
