//! Authentication handlers
//!
//! Login, confirmation codes, refresh and logout. The refresh token is only
//! ever exchanged through the session cookie.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use collab_service::dto::{
    AccessTokenResponse, ConfirmationCodeRequest, LoginRequest, RefreshResponse, VerifyCodeRequest,
};
use collab_service::{AuthService, TokenPair, VerificationService};

use crate::extractors::{AuthAccount, OptionalAuthAccount, ValidatedJson};
use crate::middleware::session_cookie::{clear_refresh_cookie, set_refresh_cookie};
use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

fn start_session(
    state: &AppState,
    jar: CookieJar,
    pair: &TokenPair,
) -> ApiResult<(CookieJar, Json<AccessTokenResponse>)> {
    let max_age = state.token_authority().signer().refresh_ttl().num_seconds();
    let jar = set_refresh_cookie(jar, state.cookie_config(), &pair.refresh_token, max_age)?;
    Ok((jar, Json(AccessTokenResponse::from(pair))))
}

/// Login with email and password
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<(CookieJar, Json<AccessTokenResponse>)> {
    let pair = AuthService::new(state.service_context()).login(request).await?;
    start_session(&state, jar, &pair)
}

/// Mail a confirmation code
///
/// POST /auth/confirmation-code
pub async fn request_confirmation_code(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ConfirmationCodeRequest>,
) -> ApiResult<StatusCode> {
    VerificationService::new(state.service_context())
        .issue_code(&request.email)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// Redeem a confirmation code and sign in
///
/// POST /auth/confirmation-code/verify
pub async fn verify_confirmation_code(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<VerifyCodeRequest>,
) -> ApiResult<(CookieJar, Json<AccessTokenResponse>)> {
    let pair = AuthService::new(state.service_context())
        .confirm_email(request)
        .await?;
    start_session(&state, jar, &pair)
}

/// Return the access token the gatekeeper minted from the refresh cookie
///
/// POST /auth/refresh
pub async fn refresh(AuthAccount(auth): AuthAccount) -> ApiResult<Json<RefreshResponse>> {
    let access_token = auth
        .renewed_token
        .ok_or_else(|| ApiError::internal(anyhow::anyhow!("refresh route reached without renewal")))?;
    Ok(Json(RefreshResponse { access_token }))
}

/// End the session. Always succeeds and always clears the cookie.
///
/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    OptionalAuthAccount(auth): OptionalAuthAccount,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    let (account_id, access_token) = match &auth {
        Some(auth) => (Some(auth.account_id), auth.access_token.as_deref()),
        None => (None, None),
    };

    AuthService::new(state.service_context())
        .logout(account_id, access_token)
        .await;

    (clear_refresh_cookie(jar, state.cookie_config()), StatusCode::OK)
}
