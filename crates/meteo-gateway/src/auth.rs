//! Gateway authentication - optional bearer token on API routes

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use tracing::warn;

/// Check a request's `Authorization` header against the configured token.
///
/// An empty configured token disables auth entirely.
pub fn is_authorized(configured_token: &str, headers: &HeaderMap) -> bool {
    if configured_token.is_empty() {
        return true;
    }

    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token);

    match provided {
        Some(token) => constant_time_eq(configured_token.as_bytes(), token.as_bytes()),
        None => {
            warn!("Gateway auth: no bearer token provided");
            false
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .trim()
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Byte comparison whose timing does not depend on where inputs differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        headers
    }

    #[test]
    fn test_auth_disabled() {
        assert!(is_authorized("", &HeaderMap::new()));
        assert!(is_authorized("", &bearer("anything")));
    }

    #[test]
    fn test_auth_valid_token() {
        assert!(is_authorized("secret123", &bearer("secret123")));
    }

    #[test]
    fn test_auth_wrong_or_missing_token() {
        assert!(!is_authorized("secret123", &bearer("wrong")));
        assert!(!is_authorized("secret123", &HeaderMap::new()));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer  spaced "), Some("spaced"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token(""), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }
}
