//! JWT signing and verification
//!
//! Signs access and refresh tokens with HS256 using the `jsonwebtoken` crate.
//! Expiry is checked here against an explicit clock with zero leeway, so a
//! token is valid only while `now < exp`.

use chrono::{DateTime, Duration, Utc};
use collab_core::AccountId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::AppError;

/// Which of the two token kinds a JWT carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub token_type: TokenKind,
    /// Random token id; keeps two tokens minted in the same second distinct
    pub jti: String,
}

impl Claims {
    /// Get the subject as an account id
    ///
    /// # Errors
    /// Returns `InvalidToken` if the subject is not numeric
    pub fn account_id(&self) -> Result<AccountId, AppError> {
        self.sub
            .parse::<AccountId>()
            .map_err(|_| AppError::InvalidToken)
    }

    /// Check if the token is expired at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Lifetime left at `now`, zero once expired
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        Duration::seconds((self.exp - now.timestamp()).max(0))
    }
}

/// Signs and verifies access/refresh tokens
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    /// Create a signer with the given secret and lifetimes in seconds
    #[must_use]
    pub fn new(secret: &str, access_token_expiry: i64, refresh_token_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::seconds(access_token_expiry),
            refresh_ttl: Duration::seconds(refresh_token_expiry),
        }
    }

    #[must_use]
    pub fn from_config(config: &JwtConfig) -> Self {
        Self::new(
            &config.secret,
            config.access_token_expiry,
            config.refresh_token_expiry,
        )
    }

    #[must_use]
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    #[must_use]
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Sign a token of `kind` for `account_id`, issued now
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn sign(&self, account_id: AccountId, kind: TokenKind) -> Result<String, AppError> {
        self.sign_at(account_id, kind, Utc::now())
    }

    /// Sign a token as if issued at `issued_at`
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn sign_at(
        &self,
        account_id: AccountId,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let lifetime = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: account_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + lifetime).timestamp(),
            token_type: kind,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode JWT: {e}")))
    }

    /// Verify signature, kind and expiry at `now`
    ///
    /// # Errors
    /// `TokenExpired` once `now >= exp`; `InvalidToken` for a bad signature,
    /// malformed token, or the wrong kind
    pub fn verify_at(
        &self,
        token: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Claims, AppError> {
        let claims = self.decode_ignoring_expiry(token, kind)?;

        if claims.is_expired_at(now) {
            return Err(AppError::TokenExpired);
        }

        Ok(claims)
    }

    /// Verify a token against the current time
    ///
    /// # Errors
    /// See [`TokenSigner::verify_at`]
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        self.verify_at(token, kind, Utc::now())
    }

    /// Check signature and kind only; the caller decides what expiry means
    ///
    /// # Errors
    /// `InvalidToken` for a bad signature, malformed token, or the wrong kind
    pub fn decode_ignoring_expiry(&self, token: &str, kind: TokenKind) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AppError::InvalidToken)?
            .claims;

        if claims.token_type != kind {
            return Err(AppError::InvalidToken);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}
