//! Axum middleware composing the rate limiter, token codec and route guards.
//!
//! # Purpose
//! Every request passes `rate_limit`. Protected requests then pass
//! `authenticate`, which turns a bearer access token into a [`Principal`],
//! and `authorize`, which checks the route group's [`RouteGuard`]. Each
//! stage terminates the request with a [`Rejection`] on failure; nothing
//! reaches a handler half-checked.
//!
//! # Key invariants
//! - Admission is decided before any token work, so floods of bad tokens
//!   are throttled too.
//! - The principal is taken from the validated token only.
//! - Credential problems (absent header, wrong scheme, empty token) are
//!   rejected before the codec sees anything.
use crate::api::error::{ApiError, CODE_INTERNAL};
use crate::app::AppState;
use crate::gateway::guard::RouteGuard;
use crate::gateway::principal::Principal;
use crate::gateway::rejection::Rejection;
use axum::extract::{RawPathParams, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use labgate_authz::{Admission, TokenKind};

pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = state.client_keys.key_for(&request);
    match state.limiter.check(&key) {
        Admission::Admitted => next.run(request).await,
        Admission::Rejected { retry_after } => {
            tracing::debug!(client = %key, ?retry_after, "rate limit exceeded");
            Rejection::RateLimited { retry_after }.into_response()
        }
    }
}

pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let verified = bearer_token(request.headers()).and_then(|token| {
        state
            .tokens
            .validate(token, TokenKind::Access)
            .map_err(|err| {
                tracing::debug!(error = %err, "access token rejected");
                Rejection::from(&err)
            })
    });
    match verified {
        Ok(claims) => {
            request.extensions_mut().insert(Principal::from(claims));
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

pub async fn authorize(
    State(guard): State<RouteGuard>,
    path_params: Option<RawPathParams>,
    request: Request,
    next: Next,
) -> Response {
    let Some(principal) = request.extensions().get::<Principal>() else {
        // Guard mounted without `authenticate` in front of it.
        tracing::error!(uri = %request.uri(), "authorize ran without an authenticated principal");
        return ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            CODE_INTERNAL,
            "Internal server error",
        )
        .into_response();
    };
    let owner = guard.owner_param().and_then(|name| {
        path_params
            .as_ref()?
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    });
    match guard.evaluate(principal, owner) {
        Ok(()) => {
            metrics::counter!("labgate_gateway_admitted_total").increment(1);
            next.run(request).await
        }
        Err(rejection) => {
            tracing::debug!(
                subject = %principal.subject_id,
                role = %principal.role,
                requirement = ?guard.requirement(),
                "access denied"
            );
            rejection.into_response()
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, Rejection> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(Rejection::MissingCredential("Missing authorization header"))?;
    let token = value
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(Rejection::MissingCredential(
            "Invalid authorization header format",
        ))?
        .trim();
    if token.is_empty() {
        return Err(Rejection::MissingCredential("Missing token"));
    }
    Ok(token)
}
