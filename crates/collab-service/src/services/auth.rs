//! Authentication service
//!
//! Handles login, code-based sign in, and logout.

use collab_common::{verify_password, AppError};
use collab_core::AccountId;
use tracing::{info, instrument, warn};

use crate::dto::{LoginRequest, VerifyCodeRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::token_authority::TokenPair;
use super::verification::VerificationService;

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Check email and password, then start a new session. Unverified
    /// addresses must redeem a confirmation code first.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<TokenPair> {
        let credentials = self
            .ctx
            .account_repo()
            .find_credentials_by_email(&request.email)
            .await?
            .ok_or_else(|| {
                warn!("Login attempt for unknown email");
                ServiceError::from(AppError::InvalidCredentials)
            })?;

        if !verify_password(&request.password, &credentials.password_hash)? {
            warn!(account_id = %credentials.id, "Login attempt with wrong password");
            return Err(AppError::InvalidCredentials.into());
        }

        if !credentials.email_verified {
            warn!(account_id = %credentials.id, "Login before email verification");
            return Err(AppError::EmailNotVerified.into());
        }

        let pair = self.ctx.token_authority().issue_pair(credentials.id).await?;
        info!(account_id = %credentials.id, "Account logged in");

        Ok(pair)
    }

    /// Redeem a confirmation code: mark the address verified and start a session
    #[instrument(skip(self, request))]
    pub async fn confirm_email(&self, request: VerifyCodeRequest) -> ServiceResult<TokenPair> {
        VerificationService::new(self.ctx)
            .verify_code(&request.email, &request.code)
            .await?;

        let account_id = self
            .ctx
            .account_repo()
            .mark_email_verified(&request.email)
            .await?
            .ok_or_else(|| ServiceError::not_found("Account", request.email.clone()))?;

        let pair = self.ctx.token_authority().issue_pair(account_id).await?;
        info!(account_id = %account_id, "Email verified");

        Ok(pair)
    }

    /// Best-effort logout. Never fails: store errors are logged and dropped.
    ///
    /// Without an access token (identity came from the refresh cookie) only
    /// the refresh record is dropped.
    #[instrument(skip(self, access_token))]
    pub async fn logout(&self, account_id: Option<AccountId>, access_token: Option<&str>) {
        let Some(account_id) = account_id else {
            info!("Logout without a resolved session");
            return;
        };

        let token = access_token.unwrap_or_default();
        match self.ctx.token_authority().revoke(account_id, token).await {
            Ok(()) => info!(account_id = %account_id, "Account logged out"),
            Err(e) => warn!(account_id = %account_id, error = %e, "Logout cleanup failed"),
        }
    }
}
