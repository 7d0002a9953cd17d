use crate::api::error::{
    ApiError, CODE_FORBIDDEN, CODE_INVALID_TOKEN, CODE_RATE_LIMITED, CODE_TOKEN_EXPIRED,
    CODE_UNAUTHORIZED,
};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use labgate_authz::{TokenError, TokenFailure};
use std::time::Duration;
use thiserror::Error;

/// Why the gateway refused a request before it reached a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{0}")]
    MissingCredential(&'static str),
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token has expired")]
    ExpiredToken,
    #[error("Insufficient role")]
    InsufficientRole,
    #[error("Insufficient permissions")]
    InsufficientPermission,
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { retry_after: Duration },
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::MissingCredential(_) | Rejection::InvalidToken | Rejection::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            Rejection::InsufficientRole | Rejection::InsufficientPermission => {
                StatusCode::FORBIDDEN
            }
            Rejection::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Rejection::MissingCredential(_) => CODE_UNAUTHORIZED,
            Rejection::InvalidToken => CODE_INVALID_TOKEN,
            Rejection::ExpiredToken => CODE_TOKEN_EXPIRED,
            Rejection::InsufficientRole | Rejection::InsufficientPermission => CODE_FORBIDDEN,
            Rejection::RateLimited { .. } => CODE_RATE_LIMITED,
        }
    }

    /// Metric label.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::MissingCredential(_) => "missing_credential",
            Rejection::InvalidToken => "invalid_token",
            Rejection::ExpiredToken => "expired_token",
            Rejection::InsufficientRole => "insufficient_role",
            Rejection::InsufficientPermission => "insufficient_permission",
            Rejection::RateLimited { .. } => "rate_limited",
        }
    }
}

impl From<&TokenError> for Rejection {
    fn from(err: &TokenError) -> Self {
        match err.failure() {
            TokenFailure::Expired => Rejection::ExpiredToken,
            TokenFailure::Invalid => Rejection::InvalidToken,
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        ApiError::new(rejection.status(), rejection.code(), &rejection.to_string())
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        metrics::counter!("labgate_gateway_rejections_total", "reason" => self.reason())
            .increment(1);
        let retry_after = match &self {
            Rejection::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        };
        let mut response = ApiError::from(self).into_response();
        if let Some(wait) = retry_after {
            // Whole seconds, rounded up so clients never retry too early.
            let secs = wait.as_secs().saturating_add(u64::from(wait.subsec_nanos() > 0));
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labgate_authz::TokenKind;

    #[test]
    fn classification_maps_to_status_and_code() {
        let cases = [
            (
                Rejection::MissingCredential("Missing authorization header"),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
            (Rejection::InvalidToken, StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            (Rejection::ExpiredToken, StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            (Rejection::InsufficientRole, StatusCode::FORBIDDEN, "FORBIDDEN"),
            (Rejection::InsufficientPermission, StatusCode::FORBIDDEN, "FORBIDDEN"),
            (
                Rejection::RateLimited {
                    retry_after: Duration::from_secs(1),
                },
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
            ),
        ];
        for (rejection, status, code) in cases {
            assert_eq!(rejection.status(), status, "{rejection:?}");
            assert_eq!(rejection.code(), code, "{rejection:?}");
        }
    }

    #[test]
    fn token_errors_split_into_expired_and_invalid() {
        assert_eq!(Rejection::from(&TokenError::Expired), Rejection::ExpiredToken);
        assert_eq!(Rejection::from(&TokenError::NotYetValid), Rejection::ExpiredToken);
        assert_eq!(
            Rejection::from(&TokenError::InvalidSignature),
            Rejection::InvalidToken
        );
        assert_eq!(
            Rejection::from(&TokenError::WrongKind {
                expected: TokenKind::Access,
                actual: TokenKind::Refresh,
            }),
            Rejection::InvalidToken
        );
    }

    #[test]
    fn rate_limited_response_sets_retry_after() {
        let response = Rejection::RateLimited {
            retry_after: Duration::from_millis(10),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER),
            Some(&HeaderValue::from_static("1"))
        );
    }
}
