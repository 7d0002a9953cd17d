//! Authenticated identity attached to a request.
//!
//! The `authenticate` middleware is the only writer: it inserts a
//! [`Principal`] into request extensions after the access token validates.
//! Handlers read it through the extractor below and never from headers,
//! query strings, or bodies.
use crate::gateway::rejection::Rejection;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use labgate_authz::{Role, SessionClaims, SubjectId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: SubjectId,
    pub email: String,
    pub role: Role,
    pub token_id: String,
}

impl Principal {
    /// True when `owner_id` names this principal's own subject.
    pub fn owns(&self, owner_id: &str) -> bool {
        self.subject_id.as_str() == owner_id
    }
}

impl From<SessionClaims> for Principal {
    fn from(claims: SessionClaims) -> Self {
        Self {
            subject_id: claims.sub,
            email: claims.email,
            role: claims.role,
            token_id: claims.jti,
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Absent only when a handler is mounted outside the authenticated router.
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(Rejection::MissingCredential("Missing authorization header"))
    }
}
