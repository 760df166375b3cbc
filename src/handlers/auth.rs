//! Credential extraction for protected routes.
//!
//! Sources are tried in a fixed order and the first one present is the only
//! one consulted, even if it turns out to be wrong:
//! 1. `Authorization` (`Bearer <token>` or a raw token)
//! 2. `X-Token`
//! 3. `?token=` query parameter

use crate::handlers::query_param;
use axum::http::{HeaderMap, HeaderName, header};

pub const X_TOKEN: HeaderName = HeaderName::from_static("x-token");

/// The credential the caller supplied, if any.
pub fn provided_token(headers: &HeaderMap, query: &[(String, String)]) -> Option<String> {
    header_text(headers, &header::AUTHORIZATION)
        .map(|value| parse_authorization(&value).to_string())
        .or_else(|| header_text(headers, &X_TOKEN).map(|value| value.trim().to_string()))
        .or_else(|| {
            query_param(query, "token")
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        })
}

/// `Bearer <token>` yields the token; any other shape is taken whole.
fn parse_authorization(value: &str) -> &str {
    match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") && !rest.trim().is_empty() => {
            rest.trim()
        }
        _ => value.trim(),
    }
}

/// Non-empty header value as text. Non-UTF-8 bytes are replaced rather than
/// dropped so the header still shadows lower-priority sources.
fn header_text(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let value = headers.get(name)?;
    if value.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(value.as_bytes()).into_owned())
}
