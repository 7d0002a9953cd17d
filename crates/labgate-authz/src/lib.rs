//! Access control primitives for the labgate gateway.
//!
//! # Purpose
//! Session token issuance and validation, the static role to permission
//! table, and per-client token bucket rate limiting. The gateway service
//! composes these in front of every protected route.
//!
//! # How it fits
//! `services/gateway` builds one [`SessionTokenCodec`] and one [`RateLimiter`]
//! at startup and shares them across requests. The permission table is a
//! process-wide static.
//!
//! # Key invariants
//! - Session tokens are HS256 only and carry exactly one [`TokenKind`].
//! - Admin satisfies every permission check.
//! - Rate limit buckets never hold more than `burst` or fewer than zero tokens.
//!
//! # Examples
//! ```rust
//! use labgate_authz::{Permission, Role, role_has};
//!
//! assert!(role_has(Role::Doctor, Permission::PatientCreate));
//! assert!(!role_has(Role::Viewer, Permission::UserDelete));
//! assert!(role_has(Role::Admin, Permission::UserDelete));
//! ```
//!
//! # Common pitfalls
//! - Both the codec and the limiter read time from an injected [`Clock`];
//!   production code passes [`SystemClock`].

mod clock;
mod errors;
mod permission;
mod rate_limit;
mod table;
mod token;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{AuthzError, AuthzResult, TokenError, TokenFailure, TokenResult};
pub use permission::{Permission, PermissionInfo};
pub use rate_limit::{
    Admission, DEFAULT_BURST, DEFAULT_RATE_PER_SECOND, DEFAULT_SWEEP_INTERVAL, RateLimitSettings,
    RateLimiter, SweeperHandle,
};
pub use table::{
    permissions_for, role_has, role_has_all, role_has_any, role_has_code, sorted_permissions,
};
pub use token::{
    DEFAULT_ACCESS_TTL, DEFAULT_ISSUER, DEFAULT_REFRESH_TTL, IssuedToken, SessionClaims,
    SessionTokenCodec, TokenPair, TokenSettings,
};
pub use types::{Role, SubjectId, TokenKind};
