//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use haven_db::entities::user;

/// The verified session token, stashed by the auth middleware.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// Optional session token extractor, for echoing the artifact back.
#[derive(Debug, Clone)]
pub struct MaybeSessionToken(pub Option<String>);

impl<S> FromRequestParts<S> for MaybeSessionToken
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<SessionToken>()
                .map(|token| token.0.clone()),
        ))
    }
}
