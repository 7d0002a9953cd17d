//! Gateway HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router: public routes, guarded route groups behind
//! `authenticate`, and the rate limiter in front of everything.
//!
//! # Notes
//! Layer order, outermost first: trace span, CORS, `rate_limit`, then for
//! protected routes `authenticate` and the group's `authorize`.
use crate::api;
use crate::gateway::client_key::ClientKeySource;
use crate::gateway::cors::CorsSettings;
use crate::gateway::guard::RouteGuard;
use crate::gateway::middleware::{authenticate, authorize, rate_limit};
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use labgate_authz::{RateLimiter, Role, SessionTokenCodec};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<SessionTokenCodec>,
    pub limiter: Arc<RateLimiter>,
    pub client_keys: ClientKeySource,
    pub cors: CorsSettings,
}

/// Routes sharing one access requirement.
///
/// The router must contain at least one route; every route in it is reached
/// only by requests carrying a valid access token that satisfies `guard`.
pub struct RouteGroup {
    guard: RouteGuard,
    router: Router<AppState>,
}

impl RouteGroup {
    pub fn new(guard: RouteGuard, router: Router<AppState>) -> Self {
        Self { guard, router }
    }

    fn into_router(self) -> Router<AppState> {
        self.router
            .route_layer(from_fn_with_state(self.guard, authorize))
    }
}

/// Gateway-owned protected routes.
fn session_groups() -> Vec<RouteGroup> {
    vec![
        RouteGroup::new(
            RouteGuard::authenticated(),
            Router::new()
                .route("/api/v1/auth/me", get(api::session::me))
                .route("/api/v1/permissions/me", get(api::session::my_permissions)),
        ),
        RouteGroup::new(
            RouteGuard::roles(&[Role::Admin]),
            Router::new().route(
                "/api/v1/permissions/roles/:role",
                get(api::session::role_permissions),
            ),
        ),
    ]
}

pub fn build_router(state: AppState, groups: Vec<RouteGroup>) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    let public = Router::new()
        .route("/api/health", get(api::system::health))
        .route("/api/v1/auth/refresh", post(api::session::refresh));

    let protected = session_groups()
        .into_iter()
        .chain(groups)
        .fold(Router::new(), |router, group| router.merge(group.into_router()))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    let cors_layer = state.cors.layer();

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(cors_layer)
        .layer(trace_layer)
        .with_state(state)
}
