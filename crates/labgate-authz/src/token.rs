//! Session token codec.
//!
//! # Purpose
//! Mints and validates the signed, self-contained session tokens that carry a
//! subject's identity and role between requests. No server-side session state
//! exists; a token is valid exactly when its signature verifies, its issuer
//! matches, the current instant lies inside its validity window, and its kind
//! is the kind the caller expects.
//!
//! # How it fits
//! The gateway validates every protected request with
//! [`SessionTokenCodec::validate`] using [`TokenKind::Access`]; the refresh
//! endpoint uses [`SessionTokenCodec::refresh_access`]. Login code outside
//! this crate calls [`SessionTokenCodec::issue_pair`].
//!
//! # Key invariants
//! - Tokens are HS256 only. Any other algorithm fails as invalid.
//! - `iat <= nbf < exp` for every minted token; TTLs are at least one second.
//! - Time checks read the injected [`Clock`]; jsonwebtoken's own wall-clock
//!   checks are disabled so there is a single time source.
//! - Expired and not-yet-valid tokens classify as expired; every other
//!   failure classifies as invalid.
//!
//! # Important configuration
//! - The secret is process-wide. Rotating it invalidates every outstanding
//!   token.
//! - `leeway` widens both ends of the validity window.
//!
//! # Examples
//! ```rust
//! use labgate_authz::{ManualClock, Role, SessionTokenCodec, SubjectId, TokenKind, TokenSettings};
//! use std::sync::Arc;
//!
//! let clock = Arc::new(ManualClock::at_unix_seconds(1_700_000_000));
//! let codec = SessionTokenCodec::new(TokenSettings::new("secret", "labgate"), clock)
//!     .expect("settings");
//! let issued = codec
//!     .issue(&SubjectId::new("user-1"), "a@lab.test", Role::Viewer, TokenKind::Access)
//!     .expect("issue");
//! let claims = codec.validate(&issued.token, TokenKind::Access).expect("valid");
//! assert_eq!(claims.role, Role::Viewer);
//! ```
//!
//! # Common pitfalls
//! - Passing a refresh token where an access token is expected fails with
//!   [`TokenError::WrongKind`]; this is intentional kind isolation.
//! - Clock skew between issuing and validating nodes shows up as
//!   [`TokenError::NotYetValid`]; configure `leeway` rather than widening TTLs.
use crate::clock::Clock;
use crate::errors::{AuthzError, AuthzResult, TokenError, TokenResult};
use crate::types::{Role, SubjectId, TokenKind};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ISSUER: &str = "schema-platform";
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Claims carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: SubjectId,
    pub email: String,
    pub role: Role,
    pub kind: TokenKind,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub leeway: Duration,
}

impl TokenSettings {
    /// Settings with the default TTLs and no leeway.
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
            leeway: Duration::ZERO,
        }
    }

    pub fn ttl_for(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    pub fn validate(&self) -> AuthzResult<()> {
        if self.secret.is_empty() {
            return Err(AuthzError::InvalidTokenSettings(
                "signing secret must not be empty".to_string(),
            ));
        }
        if self.issuer.trim().is_empty() {
            return Err(AuthzError::InvalidTokenSettings(
                "issuer must not be empty".to_string(),
            ));
        }
        for (name, ttl) in [("access", self.access_ttl), ("refresh", self.refresh_ttl)] {
            if ttl.as_secs() < 1 {
                return Err(AuthzError::InvalidTokenSettings(format!(
                    "{name} ttl must be at least one second"
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("leeway", &self.leeway)
            .finish()
    }
}

/// A freshly minted token and the facts a client needs about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub token_id: String,
    /// Unix seconds after which the token is rejected.
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

pub struct SessionTokenCodec {
    settings: TokenSettings,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl SessionTokenCodec {
    pub fn new(settings: TokenSettings, clock: Arc<dyn Clock>) -> AuthzResult<Self> {
        settings.validate()?;
        let encoding_key = EncodingKey::from_secret(settings.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(settings.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "nbf", "iss", "sub"]);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Ok(Self {
            settings,
            encoding_key,
            decoding_key,
            validation,
            clock,
        })
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    pub fn issue(
        &self,
        subject: &SubjectId,
        email: &str,
        role: Role,
        kind: TokenKind,
    ) -> TokenResult<IssuedToken> {
        let now = self.clock.unix_seconds();
        let ttl = i64::try_from(self.settings.ttl_for(kind).as_secs()).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            sub: subject.clone(),
            email: email.to_string(),
            role,
            kind,
            iss: self.settings.issuer.clone(),
            iat: now,
            nbf: now,
            exp: now.saturating_add(ttl),
            jti: uuid::Uuid::new_v4().to_string(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )
        .map_err(TokenError::Signing)?;
        Ok(IssuedToken {
            token,
            token_id: claims.jti,
            expires_at: claims.exp,
        })
    }

    /// Access and refresh token for the same subject, as handed out at login.
    pub fn issue_pair(&self, subject: &SubjectId, email: &str, role: Role) -> TokenResult<TokenPair> {
        Ok(TokenPair {
            access: self.issue(subject, email, role, TokenKind::Access)?,
            refresh: self.issue(subject, email, role, TokenKind::Refresh)?,
        })
    }

    pub fn validate(&self, token: &str, expected: TokenKind) -> TokenResult<SessionClaims> {
        let decoded =
            jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
                .map_err(map_decode_error)?;
        let claims = decoded.claims;
        if claims.exp <= claims.iat {
            return Err(TokenError::Malformed(
                "expiry does not follow issue time".to_string(),
            ));
        }

        let now = self.clock.unix_seconds();
        let leeway = i64::try_from(self.settings.leeway.as_secs()).unwrap_or(i64::MAX);
        if now.saturating_add(leeway) < claims.nbf {
            return Err(TokenError::NotYetValid);
        }
        if now >= claims.exp.saturating_add(leeway) {
            return Err(TokenError::Expired);
        }
        if claims.kind != expected {
            return Err(TokenError::WrongKind {
                expected,
                actual: claims.kind,
            });
        }
        Ok(claims)
    }

    /// Mint a new access token from a valid refresh token.
    ///
    /// The refresh token itself is not rotated; it stays usable until it expires.
    pub fn refresh_access(&self, refresh_token: &str) -> TokenResult<IssuedToken> {
        let claims = self.validate(refresh_token, TokenKind::Refresh)?;
        self.issue(&claims.sub, &claims.email, claims.role, TokenKind::Access)
    }
}

impl std::fmt::Debug for SessionTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenCodec")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::InvalidIssuer => TokenError::IssuerMismatch,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        _ => TokenError::Malformed(err.to_string()),
    }
}
