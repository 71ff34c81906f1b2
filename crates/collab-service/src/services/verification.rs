//! Email confirmation codes
//!
//! Issuance is throttled per address and verification is attempt-counted,
//! both through TTL-store counters.

use std::time::Duration;

use collab_common::{generate_numeric_code, AppError};
use tracing::{info, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

const CODE_DIGITS: u32 = 6;

/// Confirmation code service
pub struct VerificationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> VerificationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    fn code_key(email: &str) -> String {
        format!("verify:code:{email}")
    }

    fn throttle_key(email: &str) -> String {
        format!("verify:throttle:{email}")
    }

    fn attempts_key(email: &str) -> String {
        format!("verify:attempts:{email}")
    }

    /// Generate, store and mail a new code for `email`
    ///
    /// # Errors
    /// `RateLimitExceeded` when a code was issued within the throttle window
    #[instrument(skip(self, email))]
    pub async fn issue_code(&self, email: &str) -> ServiceResult<()> {
        let email = email.trim().to_lowercase();
        let config = self.ctx.verification_config();
        let store = self.ctx.ttl_store();

        let issued = store
            .increment(
                &Self::throttle_key(&email),
                Duration::from_secs(config.issue_interval_secs),
            )
            .await?;
        if issued > 1 {
            warn!("Confirmation code requested inside the throttle window");
            return Err(AppError::RateLimitExceeded.into());
        }

        let code = generate_numeric_code(CODE_DIGITS);
        store
            .set(
                &Self::code_key(&email),
                &code,
                Duration::from_secs(config.code_ttl_secs),
            )
            .await?;

        self.ctx.mailer().send_confirmation_code(&email, &code).await?;

        info!("Confirmation code issued");
        Ok(())
    }

    /// Check `code` against the pending code for `email`
    ///
    /// Each call reserves an attempt before the code is compared, so parallel
    /// guesses cannot all slip in under the limit.
    ///
    /// # Errors
    /// `TooManyAttempts` once the failure limit is reached, `InvalidCode` for a
    /// wrong or missing code
    #[instrument(skip(self, email, code))]
    pub async fn verify_code(&self, email: &str, code: &str) -> ServiceResult<()> {
        let email = email.trim().to_lowercase();
        let config = self.ctx.verification_config();
        let store = self.ctx.ttl_store();
        let attempts_key = Self::attempts_key(&email);

        let attempt = store
            .increment(&attempts_key, Duration::from_secs(config.lockout_secs))
            .await?;
        if attempt > config.max_attempts {
            warn!(attempt, "Verification locked");
            return Err(AppError::TooManyAttempts.into());
        }

        let code_key = Self::code_key(&email);
        match store.get(&code_key).await? {
            Some(stored) if stored == code.trim() => {
                store.delete(&code_key).await?;
                store.delete(&attempts_key).await?;
                info!("Confirmation code accepted");
                Ok(())
            }
            _ => {
                warn!(attempt, "Confirmation code rejected");
                Err(AppError::InvalidCode.into())
            }
        }
    }
}
