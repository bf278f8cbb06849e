//! Bearer-token authentication gate.
//!
//! One shared secret guards every endpoint except `GET /health`. An empty
//! secret disables the gate entirely; that is logged once when the router is
//! built, not per request.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{Method, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::HttpError;
use crate::health::HEALTH_PATH;

/// Decide whether an `Authorization` header value satisfies `secret`.
///
/// The header must be exactly `Bearer <token>`: case-sensitive prefix, one
/// space, and the remainder compared byte-for-byte (in constant time) with
/// the secret. An empty secret authorizes everything.
#[must_use]
pub fn authorize(header: Option<&str>, secret: &str) -> bool {
    if secret.is_empty() {
        return true;
    }

    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token.as_bytes().ct_eq(secret.as_bytes()).into())
}

/// Shared-secret configuration for the gate.
#[derive(Clone, Default)]
pub struct BearerAuth {
    secret: Arc<str>,
}

impl BearerAuth {
    /// Create a gate for `secret`. Empty disables authentication.
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Whether a non-empty secret is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Check an `Authorization` header value.
    #[must_use]
    pub fn authorize(&self, header: Option<&str>) -> bool {
        authorize(header, &self.secret)
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Middleware rejecting unauthenticated requests with 401.
///
/// Runs before routing, so unknown paths are also gated.
pub async fn require_bearer(
    State(auth): State<BearerAuth>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::GET && request.uri().path() == HEALTH_PATH {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if !auth.authorize(presented) {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Rejected request with invalid or missing bearer token"
        );
        return HttpError::Unauthorized.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_token() {
        assert!(authorize(Some("Bearer s3cret"), "s3cret"));
    }

    #[test]
    fn test_wrong_token() {
        assert!(!authorize(Some("Bearer wrong"), "s3cret"));
    }

    #[test]
    fn test_missing_header() {
        assert!(!authorize(None, "s3cret"));
    }

    #[test]
    fn test_empty_secret_disables_auth() {
        assert!(authorize(None, ""));
        assert!(authorize(Some("Basic abc"), ""));
    }

    #[test]
    fn test_malformed_headers() {
        assert!(!authorize(Some("bearer s3cret"), "s3cret"));
        assert!(!authorize(Some("Bearer  s3cret"), "s3cret"));
        assert!(!authorize(Some("Bearer s3cret "), "s3cret"));
        assert!(!authorize(Some("Bearers3cret"), "s3cret"));
        assert!(!authorize(Some("Bearer "), "s3cret"));
        assert!(!authorize(Some("s3cret"), "s3cret"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let auth = BearerAuth::new("s3cret");
        assert!(!format!("{auth:?}").contains("s3cret"));
    }
}
