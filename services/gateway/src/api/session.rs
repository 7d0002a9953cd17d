//! Session endpoints owned by the gateway.
//!
//! # Purpose and responsibility
//! Token refresh, plus read-only views of the caller's identity and of the
//! static permission table.
//!
//! # Key invariants and assumptions
//! - Refresh accepts refresh tokens only and never rotates them.
//! - Identity views render the [`Principal`] the middleware attached; they
//!   never consult request headers or bodies.
use crate::api::error::{ApiError, api_internal, api_not_found, api_validation_error};
use crate::api::types::{
    AccessTokenResponse, PrincipalResponse, RefreshRequest, RolePermissionsResponse,
};
use crate::app::AppState;
use crate::gateway::principal::Principal;
use crate::gateway::rejection::Rejection;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use labgate_authz::{Role, TokenError, sorted_permissions};

/// Exchange a refresh token for a new access token.
///
/// # Errors
/// - `VALIDATION_ERROR` when the body is not a JSON object with a token.
/// - `TOKEN_EXPIRED` / `INVALID_TOKEN` when the refresh token is refused.
pub(crate) async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(
                status = %rejection.status(),
                error = %rejection.body_text(),
                "refresh body rejected"
            );
            return api_validation_error("Invalid request body: refreshToken is required")
                .into_response();
        }
    };
    let token = request.refresh_token.trim();
    if token.is_empty() {
        return api_validation_error("refreshToken is required").into_response();
    }
    match state.tokens.refresh_access(token) {
        Ok(issued) => {
            metrics::counter!("labgate_tokens_refreshed_total").increment(1);
            Json(AccessTokenResponse::from(issued)).into_response()
        }
        Err(err @ TokenError::Signing(_)) => {
            api_internal("failed to issue access token", &err).into_response()
        }
        Err(err) => {
            tracing::debug!(error = %err, "refresh token rejected");
            Rejection::from(&err).into_response()
        }
    }
}

pub(crate) async fn me(principal: Principal) -> Json<PrincipalResponse> {
    Json(PrincipalResponse {
        subject_id: principal.subject_id.to_string(),
        email: principal.email,
        role: principal.role,
    })
}

pub(crate) async fn my_permissions(principal: Principal) -> Json<RolePermissionsResponse> {
    Json(role_view(principal.role))
}

pub(crate) async fn role_permissions(
    Path(role): Path<String>,
) -> Result<Json<RolePermissionsResponse>, ApiError> {
    let role: Role = role
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| api_not_found("role not found"))?;
    Ok(Json(role_view(role)))
}

fn role_view(role: Role) -> RolePermissionsResponse {
    RolePermissionsResponse {
        role,
        permissions: sorted_permissions(role)
            .into_iter()
            .map(|permission| permission.info())
            .collect(),
    }
}
