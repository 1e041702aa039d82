//! Bearer token guard for the admin API.
//!
//! Every `/api` request must carry `Authorization: Bearer <ADMIN_API_TOKEN>`.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;

use crate::error::AppError;
use crate::state::AppState;

/// Extract the bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}

/// Compare without exiting early on the first differing byte.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware that rejects requests without the admin API token.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` when the token is missing or wrong.
pub async fn require_api_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorized = bearer_token(request.headers())
        .is_some_and(|token| tokens_match(token, state.api_token().expose_secret()));

    if !authorized {
        tracing::warn!(uri = %request.uri(), "Rejected admin API request without valid token");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("Basic abc123")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("s3cr3t-T0ken", "s3cr3t-T0ken"));
        assert!(!tokens_match("s3cr3t-T0ken", "s3cr3t-T0keN"));
        assert!(!tokens_match("short", "s3cr3t-T0ken"));
    }
}
