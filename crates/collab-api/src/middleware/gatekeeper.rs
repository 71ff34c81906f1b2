//! Request gatekeeper
//!
//! One middleware per route class. Each resolves the caller's account and
//! stores it as an [`AuthContext`] request extension, or rejects the request.
//!
//! ```text
//! START -> PUBLIC_OK | NEEDS_AUTH
//! NEEDS_AUTH -> AUTHENTICATED | EXPIRED | REJECTED
//! EXPIRED -> RENEWED | REJECTED
//! ```
//!
//! Only an expired (but otherwise valid) access token may be renewed, from the
//! refresh cookie. Invalid and revoked tokens are rejected outright. A store
//! outage at any step is a 503, never a pass and never a 401.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use collab_common::AppError;
use collab_core::AccountId;
use collab_service::TokenError;
use tracing::{debug, warn};

use super::session_cookie::read_refresh_cookie;
use crate::response::ApiError;
use crate::state::AppState;

/// Response header carrying a silently renewed access token
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// How the gatekeeper treats a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// No authentication
    Public,
    /// Resolve identity if possible, never reject
    BestEffort,
    /// Valid access token required, renewed from the refresh cookie when expired
    Protected,
    /// The refresh endpoint: renewal from the cookie only
    Refresh,
}

/// The resolved caller of a request
#[derive(Clone)]
pub struct AuthContext {
    pub account_id: AccountId,
    /// Bearer token presented with the request
    pub access_token: Option<String>,
    /// Access token minted by silent renewal
    pub renewed_token: Option<String>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("account_id", &self.account_id)
            .field("renewed", &self.renewed_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// EXPIRED branch: mint a new access token from the refresh cookie
async fn renew_from_cookie(state: &AppState, jar: &CookieJar) -> Result<(AccountId, String), ApiError> {
    let Some(refresh) = read_refresh_cookie(jar, state.cookie_config()) else {
        debug!("No refresh cookie, session cannot be renewed");
        return Err(AppError::StaleSession.into());
    };

    match state.token_authority().renew(refresh).await {
        Ok(renewed) => Ok(renewed),
        Err(TokenError::Expired | TokenError::Invalid | TokenError::Stale | TokenError::Revoked) => {
            debug!("Refresh token rejected, session cannot be renewed");
            Err(AppError::StaleSession.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn attach_renewed(response: &mut Response, token: &str) -> Result<(), ApiError> {
    let value = HeaderValue::from_str(token).map_err(ApiError::internal)?;
    response
        .headers_mut()
        .insert(HeaderName::from_static(ACCESS_TOKEN_HEADER), value);
    Ok(())
}

/// Gatekeeper for [`RouteClass::Protected`] routes
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .map(str::to_owned)
        .ok_or(ApiError::MissingAuth)?;

    match state.token_authority().verify_access(&token).await {
        Ok(account_id) => {
            request.extensions_mut().insert(AuthContext {
                account_id,
                access_token: Some(token),
                renewed_token: None,
            });
            Ok(next.run(request).await)
        }
        Err(TokenError::Expired) => {
            let (account_id, renewed) = renew_from_cookie(&state, &jar).await?;
            debug!(account_id = %account_id, "Access token silently renewed");

            request.extensions_mut().insert(AuthContext {
                account_id,
                access_token: Some(token),
                renewed_token: Some(renewed.clone()),
            });
            let mut response = next.run(request).await;
            attach_renewed(&mut response, &renewed)?;
            Ok(response)
        }
        Err(e) => {
            if matches!(e, TokenError::StoreUnavailable(_)) {
                warn!(error = %e, "Token store unavailable during authentication");
            }
            Err(e.into())
        }
    }
}

/// Gatekeeper for [`RouteClass::Refresh`]: any presented access token is
/// ignored and the request goes straight to renewal.
pub async fn refresh_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (account_id, renewed) = renew_from_cookie(&state, &jar).await?;

    request.extensions_mut().insert(AuthContext {
        account_id,
        access_token: None,
        renewed_token: Some(renewed.clone()),
    });
    let mut response = next.run(request).await;
    attach_renewed(&mut response, &renewed)?;
    Ok(response)
}

/// Gatekeeper for [`RouteClass::BestEffort`]: resolves identity when it can
/// and always lets the request through.
pub async fn resolve_identity(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers()).map(str::to_owned);

    let account_id = match &token {
        Some(token) => match state.token_authority().verify_access(token).await {
            Ok(account_id) => Some(account_id),
            Err(TokenError::Expired) => identity_from_cookie(&state, &jar).await,
            Err(e) => {
                debug!(error = %e, "Identity not resolved");
                None
            }
        },
        None => identity_from_cookie(&state, &jar).await,
    };

    if let Some(account_id) = account_id {
        request.extensions_mut().insert(AuthContext {
            account_id,
            access_token: token,
            renewed_token: None,
        });
    }

    next.run(request).await
}

/// Account named by a live refresh cookie, if any
async fn identity_from_cookie(state: &AppState, jar: &CookieJar) -> Option<AccountId> {
    let refresh = read_refresh_cookie(jar, state.cookie_config())?;
    match state.token_authority().verify_refresh(refresh).await {
        Ok(account_id) => Some(account_id),
        Err(e) => {
            debug!(error = %e, "Refresh cookie not accepted");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_auth_context_debug_hides_tokens() {
        let ctx = AuthContext {
            account_id: AccountId::new(1),
            access_token: Some("secret".into()),
            renewed_token: Some("secret".into()),
        };
        assert!(!format!("{ctx:?}").contains("secret"));
    }
}
