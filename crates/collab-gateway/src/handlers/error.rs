//! Handler error types

use crate::protocol::CloseCode;
use collab_service::TokenError;
use thiserror::Error;

/// Errors that end a socket. Failures of an individual chat operation are
/// reported back through an `ack` instead.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Frame could not be decoded
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Frame named an event the server does not handle
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Event payload did not match the event
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Handshake token rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Token store could not answer during the handshake
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Close code for this error
    pub fn to_close_code(&self) -> CloseCode {
        match self {
            Self::InvalidFrame(_) | Self::UnknownEvent(_) | Self::InvalidPayload(_) => {
                CloseCode::DecodeError
            }
            Self::AuthenticationFailed(_) => CloseCode::AuthenticationFailed,
            Self::StoreUnavailable(_) | Self::Internal(_) => CloseCode::UnknownError,
        }
    }
}

impl From<TokenError> for HandlerError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::StoreUnavailable(msg) => Self::StoreUnavailable(msg),
            TokenError::Signing(e) => Self::Internal(e.to_string()),
            other => Self::AuthenticationFailed(other.to_string()),
        }
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
