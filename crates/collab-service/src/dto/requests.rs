//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use collab_core::{MessageId, MessageQuery};
use serde::Deserialize;
use validator::Validate;

/// Default page size for message history
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

// ============================================================================
// Auth Requests
// ============================================================================

/// Email/password login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Ask for a confirmation code to be mailed
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfirmationCodeRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Redeem a confirmation code
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub code: String,
}

// ============================================================================
// Chat Requests
// ============================================================================

/// Query string of the message history endpoint
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct HistoryQuery {
    /// Only messages older than this id
    pub before: Option<i64>,

    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl From<HistoryQuery> for MessageQuery {
    fn from(query: HistoryQuery) -> Self {
        Self {
            before: query.before.map(MessageId::new),
            limit: query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let ok = LoginRequest {
            email: "ada@example.com".into(),
            password: "hunter22".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = LoginRequest {
            email: "not-an-email".into(),
            password: String::new(),
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_verify_code_length() {
        let bad = VerifyCodeRequest {
            email: "ada@example.com".into(),
            code: "123".into(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_history_query_defaults() {
        let query = MessageQuery::from(HistoryQuery::default());
        assert_eq!(query.limit, DEFAULT_HISTORY_LIMIT);
        assert!(query.before.is_none());

        let out_of_range = HistoryQuery {
            before: None,
            limit: Some(101),
        };
        assert!(out_of_range.validate().is_err());
    }
}
