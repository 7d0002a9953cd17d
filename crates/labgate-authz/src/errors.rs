use crate::types::TokenKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("unknown role: {0}")]
    UnknownRole(String),
    #[error("unknown permission: {0}")]
    UnknownPermission(String),
    #[error("unknown token kind: {0}")]
    UnknownTokenKind(String),
    #[error("invalid token settings: {0}")]
    InvalidTokenSettings(String),
    #[error("invalid rate limit settings: {0}")]
    InvalidRateLimitSettings(String),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

/// Reasons a presented session token is refused, or a new one cannot be minted.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token signature verification failed")]
    InvalidSignature,
    #[error("token issuer mismatch")]
    IssuerMismatch,
    #[error("token has expired")]
    Expired,
    #[error("token is not valid yet")]
    NotYetValid,
    #[error("expected {expected} token, got {actual}")]
    WrongKind {
        expected: TokenKind,
        actual: TokenKind,
    },
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Coarse classification callers report to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFailure {
    Invalid,
    Expired,
}

impl TokenError {
    pub fn failure(&self) -> TokenFailure {
        match self {
            TokenError::Expired | TokenError::NotYetValid => TokenFailure::Expired,
            _ => TokenFailure::Invalid,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.failure() == TokenFailure::Expired
    }
}

pub type TokenResult<T> = Result<T, TokenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthzError::UnknownRole("root".to_string()),
            AuthzError::UnknownPermission("user:fly".to_string()),
            AuthzError::UnknownTokenKind("id".to_string()),
            AuthzError::InvalidTokenSettings("secret".to_string()),
            AuthzError::InvalidRateLimitSettings("burst".to_string()),
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }

    #[test]
    fn token_errors_classify_time_window_as_expired() {
        assert_eq!(TokenError::Expired.failure(), TokenFailure::Expired);
        assert_eq!(TokenError::NotYetValid.failure(), TokenFailure::Expired);
        assert!(TokenError::Expired.is_expired());
    }

    #[test]
    fn token_errors_classify_everything_else_as_invalid() {
        let errors = vec![
            TokenError::Malformed("bad".to_string()),
            TokenError::InvalidSignature,
            TokenError::IssuerMismatch,
            TokenError::WrongKind {
                expected: TokenKind::Access,
                actual: TokenKind::Refresh,
            },
        ];
        for error in errors {
            assert_eq!(error.failure(), TokenFailure::Invalid, "{error}");
        }
    }

    #[test]
    fn wrong_kind_names_both_kinds() {
        let err = TokenError::WrongKind {
            expected: TokenKind::Access,
            actual: TokenKind::Refresh,
        };
        assert_eq!(err.to_string(), "expected access token, got refresh");
    }
}
