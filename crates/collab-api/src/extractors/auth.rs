//! Identity extractors
//!
//! Read the [`AuthContext`] the gatekeeper attached to the request. They never
//! look at tokens themselves.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::middleware::AuthContext;
use crate::response::ApiError;

/// Caller resolved by the gatekeeper; rejects when there is none
#[derive(Debug, Clone)]
pub struct AuthAccount(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthAccount)
            .ok_or(ApiError::MissingAuth)
    }
}

/// Caller if the gatekeeper resolved one
#[derive(Debug, Clone)]
pub struct OptionalAuthAccount(pub Option<AuthContext>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuthAccount
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuthAccount(parts.extensions.get::<AuthContext>().cloned()))
    }
}
