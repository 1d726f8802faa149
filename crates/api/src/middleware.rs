//! API middleware.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use haven_common::{ImageStore, config::AuthConfig, verify_token};
use haven_core::{PropertyService, ReviewService, UserService};

use crate::extractors::SessionToken;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Property CRUD and cascade logic.
    pub property_service: PropertyService,
    /// Standalone review operations.
    pub review_service: ReviewService,
    /// Account creation and credential checks.
    pub user_service: UserService,
    /// Image storage, shared with the multipart collector.
    pub store: ImageStore,
    /// Session-token settings.
    pub auth: AuthConfig,
}

/// Authentication middleware.
///
/// Reads the session token from the `jwt` cookie or an
/// `Authorization: Bearer` header, verifies it, and stashes the user and
/// token in request extensions. Verification failures leave the request
/// anonymous; route handlers decide whether that is an error.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = cookie_token(req.headers()).or_else(|| bearer_token(req.headers()));

    if let Some(token) = token {
        if let Ok(claims) = verify_token(&token, &state.auth.jwt_secret) {
            if let Ok(user) = state.user_service.get(&claims.sub).await {
                req.extensions_mut().insert(user);
                req.extensions_mut().insert(SessionToken(token));
            }
        }
    }

    next.run(req).await
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get("jwt")
        .map(|cookie| cookie.value().to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));

        assert_eq!(bearer_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn test_bearer_token_requires_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc123"));

        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_cookie_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("jwt=abc123; other=x"),
        );

        assert_eq!(cookie_token(&headers), Some("abc123".to_string()));
    }
}
