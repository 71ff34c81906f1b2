//! Token authority
//!
//! Signs and verifies access/refresh tokens and owns the two TTL-store records
//! that give them server-side state:
//!
//! - `refresh:{accountId}` holds the single live refresh token of an account.
//!   Writing a new one makes every older refresh token `Stale`.
//! - `revoked:{token}` marks an access token dead before its `exp`. The entry
//!   never outlives the token it names.
//!
//! A TTL-store failure is always reported as [`TokenError::StoreUnavailable`];
//! it is never read as "not revoked" or "no refresh record".

use std::sync::Arc;

use chrono::Utc;
use collab_common::{AppError, TokenKind, TokenSigner};
use collab_core::{AccountId, DomainError, TtlStore};
use tracing::{debug, info, instrument, warn};

const REFRESH_PREFIX: &str = "refresh:";
const REVOKED_PREFIX: &str = "revoked:";

/// Why a token was not accepted
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Token revoked")]
    Revoked,

    #[error("Refresh token superseded or logged out")]
    Stale,

    #[error("Token store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Token signing failed")]
    Signing(#[source] AppError),
}

impl TokenError {
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Expired | Self::Invalid | Self::Revoked | Self::Stale => 401,
            Self::StoreUnavailable(_) => 503,
            Self::Signing(_) => 500,
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Expired => "TOKEN_EXPIRED",
            Self::Invalid => "INVALID_TOKEN",
            Self::Revoked => "TOKEN_REVOKED",
            Self::Stale => "STALE_SESSION",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Signing(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::TokenExpired,
            TokenError::Invalid => AppError::InvalidToken,
            TokenError::Revoked => AppError::TokenRevoked,
            TokenError::Stale => AppError::StaleSession,
            TokenError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
            TokenError::Signing(e) => e,
        }
    }
}

impl From<DomainError> for TokenError {
    fn from(err: DomainError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

fn from_signer(err: AppError) -> TokenError {
    match err {
        AppError::TokenExpired => TokenError::Expired,
        AppError::InvalidToken => TokenError::Invalid,
        other => TokenError::Signing(other),
    }
}

/// A freshly minted access/refresh pair
#[derive(Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Issues, verifies and revokes tokens. Clones share the signer and store.
#[derive(Clone)]
pub struct TokenAuthority {
    signer: Arc<TokenSigner>,
    store: Arc<dyn TtlStore>,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl TokenAuthority {
    pub fn new(signer: Arc<TokenSigner>, store: Arc<dyn TtlStore>) -> Self {
        Self { signer, store }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Key holding the live refresh token of `account_id`
    pub fn refresh_key(account_id: AccountId) -> String {
        format!("{REFRESH_PREFIX}{account_id}")
    }

    /// Key marking `token` as revoked
    pub fn revoked_key(token: &str) -> String {
        format!("{REVOKED_PREFIX}{token}")
    }

    /// Sign a new pair and make its refresh token the only live one
    ///
    /// # Errors
    /// `StoreUnavailable` if the refresh record cannot be written
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn issue_pair(&self, account_id: AccountId) -> Result<TokenPair, TokenError> {
        let access_token = self.issue_access_only(account_id)?;
        let refresh_token = self
            .signer
            .sign(account_id, TokenKind::Refresh)
            .map_err(TokenError::Signing)?;

        let refresh_ttl = self.signer.refresh_ttl().to_std().unwrap_or_default();
        self.store
            .set(&Self::refresh_key(account_id), &refresh_token, refresh_ttl)
            .await?;

        info!("Token pair issued");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.signer.access_ttl().num_seconds(),
        })
    }

    /// Sign an access token without touching the refresh record
    ///
    /// # Errors
    /// `Signing` if encoding fails
    pub fn issue_access_only(&self, account_id: AccountId) -> Result<String, TokenError> {
        self.signer
            .sign(account_id, TokenKind::Access)
            .map_err(TokenError::Signing)
    }

    /// Accept an access token that is signed, unexpired and not revoked
    ///
    /// # Errors
    /// `Expired`, `Invalid`, `Revoked`, or `StoreUnavailable`
    pub async fn verify_access(&self, token: &str) -> Result<AccountId, TokenError> {
        let claims = self
            .signer
            .verify(token, TokenKind::Access)
            .map_err(from_signer)?;
        let account_id = claims.account_id().map_err(from_signer)?;

        if self.store.exists(&Self::revoked_key(token)).await? {
            debug!(account_id = %account_id, "Revoked access token presented");
            return Err(TokenError::Revoked);
        }

        Ok(account_id)
    }

    /// Accept a refresh token that is signed, unexpired and still the live one
    ///
    /// # Errors
    /// `Expired`, `Invalid`, `Stale`, or `StoreUnavailable`
    pub async fn verify_refresh(&self, token: &str) -> Result<AccountId, TokenError> {
        let claims = self
            .signer
            .verify(token, TokenKind::Refresh)
            .map_err(from_signer)?;
        let account_id = claims.account_id().map_err(from_signer)?;

        match self.store.get(&Self::refresh_key(account_id)).await? {
            Some(stored) if stored.as_bytes() == token.as_bytes() => Ok(account_id),
            _ => {
                debug!(account_id = %account_id, "Stale refresh token presented");
                Err(TokenError::Stale)
            }
        }
    }

    /// Silent renewal: a fresh access token for the holder of a live refresh
    /// token. The refresh record is left as is, so concurrent renewals all
    /// succeed.
    ///
    /// # Errors
    /// See [`TokenAuthority::verify_refresh`]
    pub async fn renew(&self, refresh_token: &str) -> Result<(AccountId, String), TokenError> {
        let account_id = self.verify_refresh(refresh_token).await?;
        let access_token = self.issue_access_only(account_id)?;
        debug!(account_id = %account_id, "Access token renewed");
        Ok((account_id, access_token))
    }

    /// End the session of `account_id`
    ///
    /// Blacklists `access_token` for the rest of its lifetime (capped at the
    /// access lifetime) when it still has one and belongs to `account_id`,
    /// then drops the refresh record.
    ///
    /// # Errors
    /// `StoreUnavailable` if either write fails
    #[instrument(skip(self, access_token), fields(account_id = %account_id))]
    pub async fn revoke(&self, account_id: AccountId, access_token: &str) -> Result<(), TokenError> {
        match self
            .signer
            .decode_ignoring_expiry(access_token, TokenKind::Access)
        {
            Ok(claims) if claims.account_id().ok() == Some(account_id) => {
                let remaining = claims
                    .remaining_at(Utc::now())
                    .min(self.signer.access_ttl());
                if let Ok(ttl) = remaining.to_std() {
                    if !ttl.is_zero() {
                        self.store
                            .set(&Self::revoked_key(access_token), "1", ttl)
                            .await?;
                        debug!(ttl_secs = ttl.as_secs(), "Access token revoked");
                    }
                }
            }
            Ok(_) => warn!("Access token subject does not match, not revoking it"),
            Err(_) => debug!("Undecodable access token, nothing to revoke"),
        }

        self.store.delete(&Self::refresh_key(account_id)).await?;
        info!("Session revoked");

        Ok(())
    }
}
